//! Member dashboard, the post-sign-in destination.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::filters;
use crate::middleware::RequireAuth;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub display_name: String,
    pub email: Option<String>,
}

/// Display the dashboard. Requires a signed-in member.
pub async fn dashboard(RequireAuth(member): RequireAuth) -> impl IntoResponse {
    DashboardTemplate {
        display_name: member.display_name().to_string(),
        email: member.email,
    }
}
