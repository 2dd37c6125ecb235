//! Authentication route handlers.
//!
//! Handles sign-in, sign-up, password recovery, and sign-out against the
//! Supabase identity service. Failures are rendered inline on the form that
//! produced them; only a successful submit navigates.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use yeezy_marketplace_core::{Credentials, Email, Password};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_session, set_current_session, visitor_key};
use crate::models::{CurrentSession, session_keys};
use crate::services::{AuthError, AuthService, FormKind, SubmissionPermit};
use crate::state::AppState;

/// Post-auth destination.
pub const DASHBOARD_PATH: &str = "/dashboard";

// =============================================================================
// Form Types
// =============================================================================

// Forms carry raw passwords, so none of them derive `Debug`.

/// Sign-in form data.
#[derive(Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up form data.
#[derive(Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Password recovery form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub email: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for notice display.
#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

/// Notices shown above the auth forms, keyed by the `notice` query value.
fn notice_text(key: Option<&str>) -> Option<&'static str> {
    match key? {
        "confirm_email" => Some("Check your email to confirm your account!"),
        "reset_sent" => Some(
            "If an account exists for that email, we've sent a link to reset your password.",
        ),
        _ => None,
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signin.html")]
pub struct SignInTemplate {
    pub error: Option<String>,
    pub notice: Option<&'static str>,
    /// Pre-filled after a failed attempt.
    pub email: String,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignUpTemplate {
    pub error: Option<String>,
    pub full_name: String,
    pub email: String,
    pub min_password_length: usize,
}

/// Password recovery page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub error: Option<String>,
    pub notice: Option<&'static str>,
    pub email: String,
}

impl SignUpTemplate {
    fn new(error: Option<String>, full_name: String, email: String) -> Self {
        Self {
            error,
            full_name,
            email,
            min_password_length: Password::MIN_LENGTH,
        }
    }
}

// =============================================================================
// Submission Guard
// =============================================================================

/// Claim the visitor's submission slot for `form`.
///
/// Returns `None` when a submission of the same form is already in flight.
async fn begin_submission(
    state: &AppState,
    session: &Session,
    form: FormKind,
) -> Result<Option<SubmissionPermit>, AppError> {
    let visitor = visitor_key(session).await?;
    let permit = state.submissions().try_begin(&visitor, form);
    if permit.is_none() {
        tracing::debug!(form = %form, "Dropped duplicate submission");
    }
    Ok(permit)
}

// =============================================================================
// Sign-in Routes
// =============================================================================

/// Display the sign-in page.
///
/// Every form page issues the visitor key up front, so the session cookie
/// exists before the first submit and a double-submit shares one key.
pub async fn signin_page(
    session: Session,
    Query(query): Query<NoticeQuery>,
) -> Result<impl IntoResponse, AppError> {
    visitor_key(&session).await?;
    Ok(SignInTemplate {
        error: None,
        notice: notice_text(query.notice.as_deref()),
        email: String::new(),
    })
}

/// Handle sign-in form submission.
///
/// Issues exactly one password grant request. On success the session is
/// stored and the visitor is sent to the dashboard.
pub async fn signin(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    let Some(_permit) = begin_submission(&state, &session, FormKind::SignIn).await? else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let email_input = form.email.trim().to_string();
    let result = match sign_in_credentials(form) {
        Ok(credentials) => AuthService::new(state.supabase()).sign_in(credentials).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(current) => {
            set_current_session(&session, &current).await?;
            set_sentry_user(&current.user_id, current.email.as_deref());
            Ok(Redirect::to(DASHBOARD_PATH).into_response())
        }
        Err(e) => {
            let status = match e {
                AuthError::Rejected(_) => StatusCode::UNAUTHORIZED,
                _ => e.status(),
            };
            let page = SignInTemplate {
                error: Some(e.user_message().to_string()),
                notice: None,
                email: email_input,
            };
            Ok((status, page).into_response())
        }
    }
}

fn sign_in_credentials(form: SignInForm) -> Result<Credentials, AuthError> {
    let email = Email::parse(&form.email)?;
    let password = Password::new(form.password)?;
    Ok(Credentials::sign_in(email, password))
}

// =============================================================================
// Sign-up Routes
// =============================================================================

/// Display the sign-up page.
pub async fn signup_page(session: Session) -> Result<impl IntoResponse, AppError> {
    visitor_key(&session).await?;
    Ok(SignUpTemplate::new(None, String::new(), String::new()))
}

/// Handle sign-up form submission.
///
/// The new account is never signed in here; the visitor is sent to the
/// sign-in page with a notice to confirm their email.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    let Some(_permit) = begin_submission(&state, &session, FormKind::SignUp).await? else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let full_name = form.full_name.trim().to_string();
    let email_input = form.email.trim().to_string();
    let result = match sign_up_credentials(form) {
        Ok(credentials) => AuthService::new(state.supabase()).sign_up(credentials).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Ok(Redirect::to("/auth/signin?notice=confirm_email").into_response()),
        Err(e) => {
            let page = SignUpTemplate::new(
                Some(e.user_message().to_string()),
                full_name,
                email_input,
            );
            Ok((e.status(), page).into_response())
        }
    }
}

fn sign_up_credentials(form: SignUpForm) -> Result<Credentials, AuthError> {
    let email = Email::parse(&form.email)?;
    let password = Password::new(form.password)?;
    Ok(Credentials::sign_up(email, password, &form.full_name))
}

// =============================================================================
// Password Recovery Routes
// =============================================================================

/// Display the password recovery page.
pub async fn reset_password_page(
    session: Session,
    Query(query): Query<NoticeQuery>,
) -> Result<impl IntoResponse, AppError> {
    visitor_key(&session).await?;
    Ok(ResetPasswordTemplate {
        error: None,
        notice: notice_text(query.notice.as_deref()),
        email: String::new(),
    })
}

/// Handle password recovery form submission.
///
/// Always shows the same notice afterwards to prevent email enumeration.
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    let permit = begin_submission(&state, &session, FormKind::ResetPassword).await?;
    let Some(_permit) = permit else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => {
            let page = ResetPasswordTemplate {
                error: Some(e.to_string()),
                notice: None,
                email: form.email.trim().to_string(),
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    AuthService::new(state.supabase())
        .request_password_reset(&email)
        .await;

    Ok(Redirect::to("/auth/reset-password?notice=reset_sent").into_response())
}

// =============================================================================
// Sign-out Route
// =============================================================================

/// Handle sign-out.
///
/// Revokes the session with the identity service (best effort), then
/// destroys the local session.
pub async fn signout(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    if let Ok(Some(current)) = session
        .get::<CurrentSession>(session_keys::CURRENT_SESSION)
        .await
    {
        AuthService::new(state.supabase()).sign_out(&current).await;
    }

    clear_current_session(&session).await?;
    session.flush().await?;
    clear_sentry_user();

    Ok(Redirect::to("/").into_response())
}
