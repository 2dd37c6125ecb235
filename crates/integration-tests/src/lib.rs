//! Integration tests for YEEZY Marketplace.
//!
//! Drives the full storefront router in-process against a `mockito` server
//! standing in for the Supabase project.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p yeezy-marketplace-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use tower::ServiceExt;
use url::Url;

use yeezy_marketplace_storefront::config::{StorefrontConfig, SupabaseConfig};
use yeezy_marketplace_storefront::middleware::SESSION_COOKIE_NAME;
use yeezy_marketplace_storefront::state::AppState;

/// Anon key the mock backend expects on every request.
pub const ANON_KEY: &str = "anon-integration-key";

/// A storefront wired to a mock Supabase project.
pub struct TestContext {
    pub backend: mockito::ServerGuard,
    pub app: Router,
    /// Session cookie from the last response that set one.
    cookie: Option<String>,
}

/// A buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `Location` header of a redirect.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

impl TestContext {
    pub async fn new() -> Self {
        let backend = mockito::Server::new_async().await;
        let config = config_for(&backend.url());
        let app = yeezy_marketplace_storefront::app(AppState::new(config));

        Self {
            backend,
            app,
            cookie: None,
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None).await
    }

    /// POST an `application/x-www-form-urlencoded` body.
    pub async fn post_form(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        self.send(Method::POST, path, Some(form_body(form))).await
    }

    /// Build a form POST carrying the current session cookie without
    /// waiting on earlier requests, for exercising concurrent submissions.
    pub fn concurrent_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> impl Future<Output = StatusCode> + use<> {
        let request = self
            .detached(Request::post(path))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form_body(form)))
            .unwrap();
        let app = self.app.clone();

        async move { app.oneshot(request).await.unwrap().status() }
    }

    /// Like [`Self::concurrent_form`], for a GET.
    pub fn concurrent_get(&self, path: &str) -> impl Future<Output = StatusCode> + use<> {
        let request = self
            .detached(Request::get(path))
            .body(Body::empty())
            .unwrap();
        let app = self.app.clone();

        async move { app.oneshot(request).await.unwrap().status() }
    }

    /// Whether a session cookie has been issued so far.
    pub const fn has_session_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    fn detached(&self, request: axum::http::request::Builder) -> axum::http::request::Builder {
        match &self.cookie {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        }
    }

    async fn send(&mut self, method: Method, path: &str, form: Option<String>) -> TestResponse {
        let mut request = Request::builder().method(method).uri(path);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match form {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body)),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        if let Some(cookie) = session_cookie(&headers) {
            self.cookie = Some(cookie);
        }

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Storefront configuration pointing at `backend_url`.
pub fn config_for(backend_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        supabase: SupabaseConfig {
            url: Url::parse(backend_url).unwrap(),
            anon_key: SecretString::from(ANON_KEY),
        },
        product_cache_ttl: Duration::from_secs(60),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// JSON body of a session issued by the identity service.
pub fn session_json(access_token: &str, refresh_token: &str, expires_at: i64) -> String {
    serde_json::json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": expires_at,
        "refresh_token": refresh_token,
        "user": {
            "id": "9f0c2a1e-4b7d-4c1a-8f3e-2d6b5a4c3e21",
            "email": "ye@example.com",
            "user_metadata": {"full_name": "Ye West"}
        }
    })
    .to_string()
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(SESSION_COOKIE_NAME))
        .and_then(|v| v.split(';').next())
        .map(String::from)
}

fn form_body(form: &[(&str, &str)]) -> String {
    form.iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
