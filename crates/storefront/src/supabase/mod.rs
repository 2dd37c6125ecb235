//! Supabase identity (GoTrue) and data (PostgREST) API client.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`; every request carries the project's anon key
//!   in the `apikey` header
//! - The hosted project owns sessions, password storage, and the product
//!   table. This client never inspects token contents
//! - Featured products are cached in memory via `moka`
//!
//! # Example
//!
//! ```rust,ignore
//! use yeezy_marketplace_storefront::supabase::SupabaseClient;
//!
//! let client = SupabaseClient::new(&config.supabase, config.product_cache_ttl);
//!
//! let session = client.sign_in_with_password(&email, &password).await?;
//! let products = client.featured_products(6).await?;
//! ```

mod auth;
mod cache;
mod rest;
pub mod types;

pub use rest::QueryBuilder;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::SupabaseConfig;
use cache::{CacheKey, CacheValue};

/// Maximum number of bytes of a response body included in logs.
const LOGGED_BODY_LIMIT: usize = 500;

/// Errors that can occur when talking to the Supabase APIs.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// The request never produced a response (connect, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code (`error_code` or a string `code`), if any.
        code: Option<String>,
        /// Human-readable message from the response body.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built from the project URL.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl SupabaseError {
    /// Build an API error from a failed response body.
    ///
    /// GoTrue and PostgREST use different error shapes; the first present of
    /// `msg`, `message`, `error_description`, `error` is used as the message.
    fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

        let code = parsed.error_code.or_else(|| match parsed.code {
            Some(serde_json::Value::String(code)) => Some(code),
            _ => None,
        });

        let message = parsed
            .msg
            .or(parsed.message)
            .or(parsed.error_description)
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                format!(
                    "Request failed: {}",
                    status.canonical_reason().unwrap_or("unknown status")
                )
            });

        Self::Api {
            status: status.as_u16(),
            code,
            message,
        }
    }

    /// HTTP status of an API error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Union of the error body shapes returned by GoTrue and PostgREST.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
    code: Option<serde_json::Value>,
}

// =============================================================================
// SupabaseClient
// =============================================================================

/// Client for a Supabase project.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    auth_url: Url,
    rest_url: Url,
    anon_key: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl SupabaseClient {
    /// Create a new client for the configured project.
    ///
    /// `product_cache_ttl` controls how long featured product listings are
    /// served from memory.
    #[must_use]
    pub fn new(config: &SupabaseConfig, product_cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(product_cache_ttl)
            .build();

        let base = with_trailing_slash(&config.url);
        // Joining a fixed relative path onto an http(s) base URL cannot fail
        let auth_url = base.join("auth/v1/").unwrap_or_else(|_| base.clone());
        let rest_url = base.join("rest/v1/").unwrap_or_else(|_| base.clone());

        Self {
            inner: Arc::new(SupabaseClientInner {
                client: reqwest::Client::new(),
                auth_url,
                rest_url,
                anon_key: config.anon_key.clone(),
                cache,
            }),
        }
    }

    /// Resolve a path under `/auth/v1/`.
    fn auth_endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(self.inner.auth_url.join(path)?)
    }

    /// Resolve a path under `/rest/v1/`.
    fn rest_endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(self.inner.rest_url.join(path)?)
    }

    fn anon_key(&self) -> &str {
        self.inner.anon_key.expose_secret()
    }

    /// Send a request and return the raw body of a successful response.
    ///
    /// Request bodies are never logged; they may contain passwords.
    async fn send(&self, request: RequestBuilder) -> Result<String, SupabaseError> {
        let response = request.header("apikey", self.anon_key()).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = SupabaseError::from_response(status, &body);
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %truncate(&body),
                    "Supabase returned a server error"
                );
            } else {
                tracing::debug!(status = %status, error = %err, "Supabase rejected request");
            }
            return Err(err);
        }

        Ok(body)
    }

    /// Send a request and decode a JSON response.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SupabaseError> {
        let body = self.send(request).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse Supabase response"
            );
            SupabaseError::Parse(e)
        })
    }
}

/// Ensure the URL path ends in `/` so `join` appends rather than replaces.
fn with_trailing_slash(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn truncate(body: &str) -> String {
    body.chars().take(LOGGED_BODY_LIMIT).collect()
}
