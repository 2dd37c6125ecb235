//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use yeezy_marketplace_core::{EmailError, PasswordError};

use crate::supabase::SupabaseError;

/// Identity-service error codes that describe bad input rather than a refusal.
const VALIDATION_CODES: &[&str] = &[
    "weak_password",
    "validation_failed",
    "email_address_invalid",
    "email_address_not_authorized",
];

/// Errors surfaced by the auth forms.
///
/// Every variant carries a message and is rendered inline on the form that
/// produced it; none of them escape the form handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Input rejected before or by the service's validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The identity service refused the request (wrong password, account
    /// exists, email not confirmed, rate limited).
    #[error("rejected by identity service: {0}")]
    Rejected(String),

    /// The identity service could not be reached.
    #[error("identity service unreachable: {0}")]
    Network(String),

    /// The identity service answered with something unexpected.
    #[error("identity service error: {0}")]
    Service(String),
}

impl AuthError {
    /// Message for the inline error banner.
    ///
    /// Validation and rejection messages are shown verbatim. Transport and
    /// server failures get a generic message; details go to the logs.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation(msg) | Self::Rejected(msg) => msg,
            Self::Network(_) => {
                "We couldn't reach the sign-in service. Check your connection and try again."
            }
            Self::Service(_) => "Something went wrong on our side. Please try again in a moment.",
        }
    }

    /// HTTP status for the re-rendered form.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Network(_) | Self::Service(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<SupabaseError> for AuthError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Http(e) => Self::Network(e.to_string()),
            SupabaseError::Api {
                status,
                code,
                message,
            } => {
                if code
                    .as_deref()
                    .is_some_and(|c| VALIDATION_CODES.contains(&c))
                {
                    Self::Validation(message)
                } else if (400..500).contains(&status) {
                    Self::Rejected(message)
                } else {
                    Self::Service(format!("status {status}: {message}"))
                }
            }
            SupabaseError::Parse(e) => Self::Service(format!("unexpected response: {e}")),
            SupabaseError::Url(e) => Self::Service(format!("bad endpoint: {e}")),
        }
    }
}

impl From<EmailError> for AuthError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        Self::Validation(err.to_string())
    }
}
