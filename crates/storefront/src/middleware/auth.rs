//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in member in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{TimeDelta, Utc};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::clear_sentry_user;
use crate::models::{CurrentSession, session_keys};
use crate::services::{AuthService, FormKind};
use crate::state::AppState;

/// Sessions expiring within this window are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 30;

/// Where unauthenticated visitors are sent.
pub const SIGN_IN_PATH: &str = "/auth/signin";

/// Extractor that requires a signed-in member.
///
/// A session close to expiry is refreshed with the identity service first,
/// at most once at a time per visitor. Concurrent requests keep using the
/// current session while it is still valid. If the visitor is not signed
/// in, or the refresh fails, the session is cleared and the visitor is
/// redirected to the sign-in page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(member): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", member.display_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentSession);

/// Error returned when authentication is required but the visitor is not signed in.
pub enum AuthRejection {
    /// Redirect to the sign-in page.
    RedirectToSignIn,
    /// No session layer is installed.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn => Redirect::to(SIGN_IN_PATH).into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::MissingSession)?;

        let current: CurrentSession = session
            .get(session_keys::CURRENT_SESSION)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection::RedirectToSignIn)?;

        let now = Utc::now();
        if !current.expires_within(TimeDelta::seconds(REFRESH_MARGIN_SECS), now) {
            return Ok(Self(current));
        }

        let visitor = visitor_key(session)
            .await
            .map_err(|_| AuthRejection::RedirectToSignIn)?;
        let Some(_permit) = state
            .submissions()
            .try_begin(&visitor, FormKind::SessionRefresh)
        else {
            // Another request is already rotating the refresh token; the
            // stored session is left for it to replace.
            if current.expires_within(TimeDelta::zero(), now) {
                return Err(AuthRejection::RedirectToSignIn);
            }
            tracing::debug!("Refresh in flight, using current session");
            return Ok(Self(current));
        };

        match AuthService::new(state.supabase()).refresh(&current).await {
            Ok(refreshed) => {
                if let Err(e) = set_current_session(session, &refreshed).await {
                    tracing::error!("Failed to store refreshed session: {e}");
                    return Err(AuthRejection::RedirectToSignIn);
                }
                tracing::debug!(user_id = %refreshed.user_id, "Session refreshed");
                Ok(Self(refreshed))
            }
            Err(e) => {
                tracing::info!(error = %e, "Session refresh failed, signing out");
                if let Err(e) = clear_current_session(session).await {
                    tracing::error!("Failed to clear session: {e}");
                }
                clear_sentry_user();
                Err(AuthRejection::RedirectToSignIn)
            }
        }
    }
}

/// Extractor that optionally gets the current member.
///
/// Unlike `RequireAuth`, this never rejects and never refreshes; it is used
/// for cosmetic differences such as the header links.
pub struct OptionalAuth(pub Option<CurrentSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentSession>(session_keys::CURRENT_SESSION)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(current))
    }
}

/// Helper to store the signed-in member's session.
///
/// The session ID is cycled first so a pre-sign-in ID cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_session(
    session: &Session,
    current: &CurrentSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_SESSION, current).await
}

/// Helper to clear the signed-in member from the session (sign-out).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_session(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentSession>(session_keys::CURRENT_SESSION)
        .await?;
    Ok(())
}

/// Stable per-visitor key used to track in-flight form submissions.
///
/// Generated on first use and kept in the cookie session.
///
/// # Errors
///
/// Returns an error if the session cannot be read or modified.
pub async fn visitor_key(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(key) = session.get::<String>(session_keys::VISITOR_KEY).await? {
        return Ok(key);
    }

    let key = Uuid::new_v4().to_string();
    session.insert(session_keys::VISITOR_KEY, &key).await?;
    Ok(key)
}
