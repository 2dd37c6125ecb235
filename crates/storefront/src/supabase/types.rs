//! Wire types returned by the Supabase identity API.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A session issued by the identity service.
///
/// Implements `Debug` manually to redact tokens.
#[derive(Clone, Deserialize)]
pub struct Session {
    /// Bearer token for API calls on behalf of the user.
    pub access_token: String,
    /// Token used to obtain a new session.
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    /// Absolute expiry as a unix timestamp (not sent by older servers).
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// The authenticated user.
    pub user: User,
}

impl Session {
    /// Absolute expiry of the access token.
    ///
    /// Falls back to `now + expires_in` when the server omits `expires_at`.
    #[must_use]
    pub fn expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| now + TimeDelta::seconds(self.expires_in))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// A user record from the identity service.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// User UUID.
    pub id: String,
    /// Primary email, absent for phone-only accounts.
    #[serde(default)]
    pub email: Option<String>,
    /// Profile data supplied at sign-up.
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Profile data stored alongside the user (`options.data` at sign-up).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Display name collected by the sign-up form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Response to a sign-up request.
///
/// When email confirmation is enabled the service returns the bare user;
/// otherwise it returns a full session.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    /// Account created and signed in (confirmation disabled).
    Session(Box<Session>),
    /// Account created, confirmation pending.
    User(User),
}

impl SignUpResponse {
    /// The created user.
    #[must_use]
    pub fn user(&self) -> &User {
        match self {
            Self::Session(session) => &session.user,
            Self::User(user) => user,
        }
    }

    /// Whether the account must be confirmed out-of-band before sign-in.
    #[must_use]
    pub const fn confirmation_required(&self) -> bool {
        matches!(self, Self::User(_))
    }
}
