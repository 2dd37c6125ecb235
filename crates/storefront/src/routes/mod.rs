//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (featured products)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (identity service reachable)
//!
//! # Auth
//! GET  /auth/signin            - Sign-in page
//! POST /auth/signin            - Sign-in action
//! GET  /auth/signup            - Sign-up page
//! POST /auth/signup            - Sign-up action
//! GET  /auth/reset-password    - Password recovery page
//! POST /auth/reset-password    - Password recovery action
//! POST /auth/signout           - Sign-out action
//!
//! # Members (requires auth)
//! GET  /dashboard              - Member dashboard
//! ```

pub mod auth;
pub mod dashboard;
pub mod home;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signin", get(auth::signin_page).post(auth::signin))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route(
            "/reset-password",
            get(auth::reset_password_page).post(auth::reset_password),
        )
        .route("/signout", post(auth::signout))
}

/// Create all page routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route(auth::DASHBOARD_PATH, get(dashboard::dashboard))
        .nest("/auth", auth_routes())
}
