//! Featured product listing for the home page.

use std::future::Future;

use yeezy_marketplace_core::Product;

use crate::supabase::{SupabaseClient, SupabaseError};

/// Number of featured products shown on the home page.
pub const FEATURED_LIMIT: usize = 6;

/// Source of featured products.
pub trait ProductCatalog: Send + Sync {
    /// Fetch up to `limit` featured products.
    fn featured(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Product>, SupabaseError>> + Send;
}

impl ProductCatalog for SupabaseClient {
    async fn featured(&self, limit: usize) -> Result<Vec<Product>, SupabaseError> {
        self.featured_products(limit).await
    }
}

/// Load the featured products for the home page.
///
/// A failed fetch is logged and treated as an empty listing so the page
/// still renders.
pub async fn load_featured<C: ProductCatalog>(catalog: &C) -> Vec<Product> {
    match catalog.featured(FEATURED_LIMIT).await {
        Ok(mut products) => {
            products.truncate(FEATURED_LIMIT);
            products
        }
        Err(e) => {
            tracing::error!("Failed to fetch featured products: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Fixed(Result<usize, ()>);

    impl ProductCatalog for Fixed {
        async fn featured(&self, _limit: usize) -> Result<Vec<Product>, SupabaseError> {
            match self.0 {
                Ok(count) => Ok((0..count)
                    .map(|i| {
                        serde_json::from_value(serde_json::json!({
                            "id": i,
                            "name": format!("Item {i}"),
                            "price": 10,
                            "featured": true
                        }))
                        .unwrap()
                    })
                    .collect()),
                Err(()) => Err(SupabaseError::Api {
                    status: 503,
                    code: None,
                    message: "unavailable".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_failure_yields_empty_listing() {
        assert!(load_featured(&Fixed(Err(()))).await.is_empty());
    }

    #[tokio::test]
    async fn test_listing_capped_at_limit() {
        assert_eq!(load_featured(&Fixed(Ok(9))).await.len(), FEATURED_LIMIT);
        assert_eq!(load_featured(&Fixed(Ok(2))).await.len(), 2);
    }
}
