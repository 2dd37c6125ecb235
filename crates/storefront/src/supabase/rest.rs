//! Data API (`/rest/v1`) queries.
//!
//! Only the read-only subset of PostgREST filtering the storefront needs:
//! column selection, equality filters and a row limit.

use std::fmt::Display;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use yeezy_marketplace_core::Product;

use super::cache::{CacheKey, CacheValue};
use super::{SupabaseClient, SupabaseError};

/// Table holding the catalog.
const PRODUCTS_TABLE: &str = "products";

/// A read-only query against one table.
///
/// ```rust,ignore
/// let rows: Vec<Product> = client
///     .table("products")
///     .select("*")
///     .eq("featured", true)
///     .limit(6)
///     .fetch()
///     .await?;
/// ```
#[must_use = "a query does nothing until fetched"]
pub struct QueryBuilder<'a> {
    client: &'a SupabaseClient,
    table: String,
    params: Vec<(String, String)>,
}

impl SupabaseClient {
    /// Start a query against `table`.
    pub fn table(&self, table: &str) -> QueryBuilder<'_> {
        QueryBuilder {
            client: self,
            table: table.to_string(),
            params: Vec::new(),
        }
    }

    /// Fetch up to `limit` products flagged as featured.
    ///
    /// Results are cached for the configured TTL. An empty result is a
    /// successful, empty listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or rows don't match [`Product`].
    #[instrument(skip(self))]
    pub async fn featured_products(&self, limit: usize) -> Result<Vec<Product>, SupabaseError> {
        let key = CacheKey::FeaturedProducts { limit };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for featured products");
            return Ok(products.as_ref().clone());
        }

        let products: Vec<Product> = self
            .table(PRODUCTS_TABLE)
            .select("*")
            .eq("featured", true)
            .limit(limit)
            .fetch()
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::Products(Arc::new(products.clone())))
            .await;

        Ok(products)
    }
}

impl QueryBuilder<'_> {
    /// Columns to return (`select=`).
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    /// Keep rows where `column` equals `value` (`column=eq.value`).
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Return at most `count` rows.
    pub fn limit(mut self, count: usize) -> Self {
        self.params.push(("limit".to_string(), count.to_string()));
        self
    }

    /// Run the query and decode each row as `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a row doesn't decode.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, SupabaseError> {
        let mut url = self.client.rest_endpoint(&self.table)?;
        url.query_pairs_mut().extend_pairs(&self.params);

        let anon_key = self.client.anon_key();
        let request = self
            .client
            .inner
            .client
            .get(url)
            .bearer_auth(anon_key)
            .header("accept", "application/json");

        self.client.send_json(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use mockito::Matcher;
    use secrecy::SecretString;
    use url::Url;

    use super::*;
    use crate::config::SupabaseConfig;

    fn client(server: &mockito::ServerGuard) -> SupabaseClient {
        SupabaseClient::new(
            &SupabaseConfig {
                url: Url::parse(&server.url()).unwrap(),
                anon_key: SecretString::from("anon-test-key"),
            },
            Duration::from_secs(60),
        )
    }

    fn featured_query() -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("select".to_string(), "*".to_string()),
            Matcher::UrlEncoded("featured".to_string(), "eq.true".to_string()),
            Matcher::UrlEncoded("limit".to_string(), "6".to_string()),
        ])
    }

    #[tokio::test]
    async fn test_featured_products_query_and_decode() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/rest/v1/products".to_string()))
            .match_query(featured_query())
            .match_header("apikey", "anon-test-key")
            .match_header("authorization", "Bearer anon-test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"id": 1, "name": "Slide", "description": "EVA", "price": 60, "category": "footwear", "featured": true},
                    {"id": 2, "name": "Hoodie", "description": null, "price": "120.00", "category": "apparel", "featured": true}
                ]"#,
            )
            .expect(1)
            .create_async()
            .await;

        let products = client(&server).featured_products(6).await.unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Slide");
        assert_eq!(products[1].price.to_string(), "$120.00");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_featured_products_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/rest/v1/products".to_string()))
            .match_query(featured_query())
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let client = client(&server);
        assert!(client.featured_products(6).await.unwrap().is_empty());
        assert!(client.featured_products(6).await.unwrap().is_empty());
        mock.assert_async().await;
    }
}
