//! Session-related types.
//!
//! Types stored in the visitor's server-side session for authentication state.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::supabase;

/// The identity-service session of the signed-in visitor.
///
/// Tokens are kept opaque; only the expiry is inspected, to decide when to
/// refresh. Implements `Debug` manually to redact tokens.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentSession {
    /// Identity-service user ID.
    pub user_id: String,
    /// Account email.
    pub email: Option<String>,
    /// Display name from the profile data.
    pub full_name: Option<String>,
    access_token: String,
    refresh_token: String,
    /// When the access token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl CurrentSession {
    /// Build the stored session from an identity-service session.
    #[must_use]
    pub fn from_supabase(session: supabase::Session, now: DateTime<Utc>) -> Self {
        let expires_at = session.expiry(now);
        Self {
            user_id: session.user.id,
            email: session.user.email,
            full_name: session.user.user_metadata.full_name,
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_at,
        }
    }

    /// Bearer token for calls on the user's behalf.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Token for obtaining a fresh session.
    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Whether the access token expires within `margin` of `now`.
    #[must_use]
    pub fn expires_within(&self, margin: TimeDelta, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + margin
    }

    /// Name to greet the user with: the display name, else the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("member")
    }
}

impl std::fmt::Debug for CurrentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentSession")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for the signed-in visitor's identity-service session.
    pub const CURRENT_SESSION: &str = "current_session";

    /// Key for the random per-visitor ID that scopes in-flight form submissions.
    pub const VISITOR_KEY: &str = "visitor_key";
}
