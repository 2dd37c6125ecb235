//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::supabase::SupabaseClient;
use crate::services::SubmissionGate;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the Supabase client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    supabase: SupabaseClient,
    submissions: SubmissionGate,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let supabase = SupabaseClient::new(&config.supabase, config.product_cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                supabase,
                submissions: SubmissionGate::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Supabase client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }

    /// Get a reference to the in-flight submission tracker.
    #[must_use]
    pub fn submissions(&self) -> &SubmissionGate {
        &self.inner.submissions
    }
}
