//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use yeezy_marketplace_core::Product;

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::load_featured;
use crate::state::AppState;

/// Product card data for templates.
#[derive(Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub category: Option<String>,
    /// Stands in for a product image.
    pub glyph: String,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone().filter(|d| !d.is_empty()),
            price: product.price.to_string(),
            category: product.category.clone().filter(|c| !c.is_empty()),
            glyph: product
                .placeholder_glyph()
                .map(String::from)
                .unwrap_or_default(),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Featured products; empty renders the empty state.
    pub products: Vec<ProductCard>,
    /// Whether the visitor has a session (header shows a dashboard link).
    pub signed_in: bool,
}

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
) -> impl IntoResponse {
    let products = load_featured(state.supabase())
        .await
        .iter()
        .map(ProductCard::from)
        .collect();

    HomeTemplate {
        products,
        signed_in: current.is_some(),
    }
}
