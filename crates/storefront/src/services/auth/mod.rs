//! Authentication service.
//!
//! Drives the sign-in, sign-up, refresh, sign-out, and password recovery
//! flows against an [`IdentityProvider`]. The provider is passed in
//! explicitly, so the flows can be exercised without the hosted service.

mod error;

pub use error::AuthError;

use std::future::Future;

use chrono::Utc;
use tracing::{info, warn};

use yeezy_marketplace_core::{Credentials, Email};

use crate::models::CurrentSession;
use crate::supabase::{SupabaseClient, UserMetadata};

/// Result of a successful sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    /// ID of the created user.
    pub user_id: String,
    /// Whether the service is waiting for an email confirmation.
    pub confirmation_required: bool,
}

/// The remote identity service, as seen by the auth flows.
pub trait IdentityProvider: Send + Sync {
    /// Exchange email and password for a session.
    fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<CurrentSession, AuthError>> + Send;

    /// Create an account carrying the display name as profile data.
    fn register(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<SignUpOutcome, AuthError>> + Send;

    /// Exchange a refresh token for a new session.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<CurrentSession, AuthError>> + Send;

    /// Revoke a session.
    fn revoke(&self, access_token: &str) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Send a password recovery email.
    fn send_recovery(&self, email: &Email) -> impl Future<Output = Result<(), AuthError>> + Send;
}

impl IdentityProvider for SupabaseClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<CurrentSession, AuthError> {
        let session = self
            .sign_in_with_password(&credentials.email, &credentials.password)
            .await?;
        Ok(CurrentSession::from_supabase(session, Utc::now()))
    }

    async fn register(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let metadata = UserMetadata {
            full_name: credentials.full_name.clone(),
        };
        let response = self
            .sign_up(&credentials.email, &credentials.password, &metadata)
            .await?;
        Ok(SignUpOutcome {
            user_id: response.user().id.clone(),
            confirmation_required: response.confirmation_required(),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<CurrentSession, AuthError> {
        let session = self.refresh_session(refresh_token).await?;
        Ok(CurrentSession::from_supabase(session, Utc::now()))
    }

    async fn revoke(&self, access_token: &str) -> Result<(), AuthError> {
        Ok(self.sign_out(access_token).await?)
    }

    async fn send_recovery(&self, email: &Email) -> Result<(), AuthError> {
        Ok(self.send_password_recovery(email).await?)
    }
}

/// Authentication service.
///
/// Each operation issues at most one request to the provider and consumes
/// the credentials it is given, so they are dropped when it returns.
pub struct AuthService<'a, P> {
    provider: &'a P,
}

impl<'a, P: IdentityProvider> AuthService<'a, P> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged; there is no retry.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<CurrentSession, AuthError> {
        match self.provider.authenticate(&credentials).await {
            Ok(session) => {
                info!(user_id = %session.user_id, "Sign-in succeeded");
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                Err(e)
            }
        }
    }

    /// Create an account.
    ///
    /// The password length is checked first; a short password never reaches
    /// the provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a short password, otherwise the
    /// provider's error.
    pub async fn sign_up(&self, credentials: Credentials) -> Result<SignUpOutcome, AuthError> {
        credentials.password.ensure_min_length()?;

        match self.provider.register(&credentials).await {
            Ok(outcome) => {
                info!(
                    user_id = %outcome.user_id,
                    confirmation_required = outcome.confirmation_required,
                    "Sign-up succeeded"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "Sign-up failed");
                Err(e)
            }
        }
    }

    /// Obtain a fresh session for one that is about to expire.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; the caller should drop the session.
    pub async fn refresh(&self, session: &CurrentSession) -> Result<CurrentSession, AuthError> {
        self.provider.refresh(session.refresh_token()).await
    }

    /// Revoke a session. Failures are logged and otherwise ignored.
    pub async fn sign_out(&self, session: &CurrentSession) {
        if let Err(e) = self.provider.revoke(session.access_token()).await {
            warn!(error = %e, "Failed to revoke session");
        }
    }

    /// Request a password recovery email.
    ///
    /// Provider failures are logged and swallowed so the response does not
    /// reveal whether the account exists.
    pub async fn request_password_reset(&self, email: &Email) {
        if let Err(e) = self.provider.send_recovery(email).await {
            warn!(error = %e, "Password recovery request failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    //! In-memory identity provider for flow tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeDelta, Utc};
    use serde_json::json;

    use super::*;

    /// Records calls and answers with a fixed outcome.
    #[derive(Default)]
    pub struct FakeIdentity {
        pub calls: AtomicUsize,
        pub failure: Mutex<Option<AuthError>>,
        pub last_full_name: Mutex<Option<String>>,
    }

    impl FakeIdentity {
        pub fn failing(err: AuthError) -> Self {
            Self {
                failure: Mutex::new(Some(err)),
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn outcome(&self) -> Result<(), AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.failure.lock().unwrap().clone().map_or(Ok(()), Err)
        }
    }

    pub fn session_for(user_id: &str) -> CurrentSession {
        let session = serde_json::from_value(json!({
            "access_token": format!("at-{user_id}"),
            "refresh_token": format!("rt-{user_id}"),
            "expires_in": 3600,
            "user": {"id": user_id, "email": "ye@example.com"}
        }))
        .unwrap();
        CurrentSession::from_supabase(session, Utc::now() - TimeDelta::seconds(1))
    }

    impl IdentityProvider for FakeIdentity {
        async fn authenticate(&self, _: &Credentials) -> Result<CurrentSession, AuthError> {
            self.outcome()?;
            Ok(session_for("u-1"))
        }

        async fn register(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
            self.outcome()?;
            *self.last_full_name.lock().unwrap() = credentials.full_name.clone();
            Ok(SignUpOutcome {
                user_id: "u-2".to_string(),
                confirmation_required: true,
            })
        }

        async fn refresh(&self, _: &str) -> Result<CurrentSession, AuthError> {
            self.outcome()?;
            Ok(session_for("u-1"))
        }

        async fn revoke(&self, _: &str) -> Result<(), AuthError> {
            self.outcome()
        }

        async fn send_recovery(&self, _: &Email) -> Result<(), AuthError> {
            self.outcome()
        }
    }
}
