//! Sign-in, sign-up, session refresh, sign-out, and password recovery flows.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use chrono::Utc;
use mockito::{Matcher, Mock};
use serde_json::json;

use yeezy_marketplace_integration_tests::{ANON_KEY, TestContext, TestResponse, session_json};

fn token_path() -> Matcher {
    Matcher::Regex(r"^/auth/v1/token".to_string())
}

fn grant(kind: &str) -> Matcher {
    Matcher::UrlEncoded("grant_type".to_string(), kind.to_string())
}

async fn mock_sign_in(ctx: &mut TestContext, expires_in_secs: i64) -> Mock {
    let expires_at = Utc::now().timestamp() + expires_in_secs;
    ctx.backend
        .mock("POST", token_path())
        .match_query(grant("password"))
        .match_header("apikey", ANON_KEY)
        .match_body(Matcher::Json(json!({
            "email": "ye@example.com",
            "password": "yeezy350"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(session_json("at-1", "rt-1", expires_at))
        .expect(1)
        .create_async()
        .await
}

async fn sign_in(ctx: &mut TestContext) -> TestResponse {
    ctx.post_form(
        "/auth/signin",
        &[("email", "ye@example.com"), ("password", "yeezy350")],
    )
    .await
}

// =============================================================================
// Sign-in
// =============================================================================

#[tokio::test]
async fn test_sign_in_success_redirects_to_dashboard() {
    let mut ctx = TestContext::new().await;
    let mock = mock_sign_in(&mut ctx, 3600).await;

    let response = sign_in(&mut ctx).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/dashboard"));
    assert!(!response.body.contains("banner-error"));
    mock.assert_async().await;

    let dashboard = ctx.get("/dashboard").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert!(dashboard.body.contains("WELCOME, YE WEST"));
    assert!(!dashboard.body.contains("at-1"));
}

#[tokio::test]
async fn test_sign_in_rejected_renders_message_without_redirect() {
    let mut ctx = TestContext::new().await;
    let mock = ctx
        .backend
        .mock("POST", token_path())
        .match_query(grant("password"))
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let response = sign_in(&mut ctx).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.location(), None);
    assert!(response.body.contains("Invalid login credentials"));
    assert!(response.body.contains("value=\"ye@example.com\""));
    mock.assert_async().await;

    let dashboard = ctx.get("/dashboard").await;
    assert_eq!(dashboard.location(), Some("/auth/signin"));
}

#[tokio::test]
async fn test_sign_in_unreachable_service_shows_generic_message() {
    let mut ctx = TestContext::new().await;
    let _mock = ctx
        .backend
        .mock("POST", token_path())
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let response = sign_in(&mut ctx).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response.body.contains("Something went wrong on our side"));
    assert!(!response.body.contains("upstream exploded"));
}

#[tokio::test]
async fn test_sign_in_invalid_email_issues_no_request() {
    let mut ctx = TestContext::new().await;
    let mock = ctx
        .backend
        .mock("POST", token_path())
        .expect(0)
        .create_async()
        .await;

    let response = ctx
        .post_form(
            "/auth/signin",
            &[("email", "ye.example.com"), ("password", "yeezy350")],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Email must contain an @ symbol"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_form_pages_issue_session_cookie() {
    for page in ["/auth/signin", "/auth/signup", "/auth/reset-password"] {
        let mut ctx = TestContext::new().await;
        let response = ctx.get(page).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(ctx.has_session_cookie(), "{page} set no session cookie");
    }
}

#[tokio::test]
async fn test_duplicate_sign_in_while_pending_is_dropped() {
    let mut ctx = TestContext::new().await;
    assert_eq!(ctx.get("/auth/signin").await.status, StatusCode::OK);

    let mock = ctx
        .backend
        .mock("POST", token_path())
        .match_query(grant("password"))
        .with_status(400)
        .with_body_from_request(|_| {
            std::thread::sleep(Duration::from_millis(500));
            br#"{"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#.to_vec()
        })
        .expect(1)
        .create_async()
        .await;

    let form = [("email", "ye@example.com"), ("password", "yeezy350")];
    let (a, b) = tokio::join!(
        ctx.concurrent_form("/auth/signin", &form),
        ctx.concurrent_form("/auth/signin", &form),
    );

    let mut statuses = [a.as_u16(), b.as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [204, 401]);
    mock.assert_async().await;
}

// =============================================================================
// Sign-up
// =============================================================================

#[tokio::test]
async fn test_sign_up_short_password_issues_no_request() {
    let mut ctx = TestContext::new().await;
    let mock = ctx
        .backend
        .mock("POST", "/auth/v1/signup")
        .expect(0)
        .create_async()
        .await;

    let response = ctx
        .post_form(
            "/auth/signup",
            &[
                ("full_name", "Ye West"),
                ("email", "ye@example.com"),
                ("password", "12345"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .body
            .contains("Password must be at least 6 characters")
    );
    assert!(response.body.contains("value=\"Ye West\""));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_sign_up_success_redirects_to_sign_in_not_dashboard() {
    let mut ctx = TestContext::new().await;
    let expires_at = Utc::now().timestamp() + 3600;
    let mock = ctx
        .backend
        .mock("POST", "/auth/v1/signup")
        .match_body(Matcher::Json(json!({
            "email": "ye@example.com",
            "password": "123456",
            "data": {"full_name": "Ye West"}
        })))
        .with_status(200)
        // Confirmation disabled: the service hands back a full session.
        .with_body(session_json("at-new", "rt-new", expires_at))
        .expect(1)
        .create_async()
        .await;

    let response = ctx
        .post_form(
            "/auth/signup",
            &[
                ("full_name", "Ye West"),
                ("email", "ye@example.com"),
                ("password", "123456"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.location(),
        Some("/auth/signin?notice=confirm_email")
    );
    mock.assert_async().await;

    let notice = ctx.get("/auth/signin?notice=confirm_email").await;
    assert!(notice.body.contains("Check your email to confirm your account!"));

    let dashboard = ctx.get("/dashboard").await;
    assert_eq!(dashboard.status, StatusCode::SEE_OTHER);
    assert_eq!(dashboard.location(), Some("/auth/signin"));
}

#[tokio::test]
async fn test_sign_up_existing_account_renders_message() {
    let mut ctx = TestContext::new().await;
    let _mock = ctx
        .backend
        .mock("POST", "/auth/v1/signup")
        .with_status(422)
        .with_body(r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#)
        .create_async()
        .await;

    let response = ctx
        .post_form(
            "/auth/signup",
            &[
                ("full_name", "Ye West"),
                ("email", "ye@example.com"),
                ("password", "123456"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.location(), None);
    assert!(response.body.contains("User already registered"));
}

#[tokio::test]
async fn test_duplicate_sign_up_while_pending_is_dropped() {
    let mut ctx = TestContext::new().await;
    assert_eq!(ctx.get("/auth/signup").await.status, StatusCode::OK);

    let mock = ctx
        .backend
        .mock("POST", "/auth/v1/signup")
        .with_status(422)
        .with_body_from_request(|_| {
            std::thread::sleep(Duration::from_millis(500));
            br#"{"error_code":"user_already_exists","msg":"User already registered"}"#.to_vec()
        })
        .expect(1)
        .create_async()
        .await;

    let form = [
        ("full_name", "Ye West"),
        ("email", "ye@example.com"),
        ("password", "123456"),
    ];
    let (a, b) = tokio::join!(
        ctx.concurrent_form("/auth/signup", &form),
        ctx.concurrent_form("/auth/signup", &form),
    );

    let mut statuses = [a.as_u16(), b.as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [204, 422]);
    mock.assert_async().await;
}

// =============================================================================
// Protected pages and session refresh
// =============================================================================

#[tokio::test]
async fn test_dashboard_requires_sign_in() {
    let mut ctx = TestContext::new().await;

    let response = ctx.get("/dashboard").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/auth/signin"));
}

#[tokio::test]
async fn test_expiring_session_is_refreshed_once() {
    let mut ctx = TestContext::new().await;
    let _sign_in = mock_sign_in(&mut ctx, 10).await;
    assert_eq!(sign_in(&mut ctx).await.status, StatusCode::SEE_OTHER);

    let refreshed_until = Utc::now().timestamp() + 3600;
    let refresh = ctx
        .backend
        .mock("POST", token_path())
        .match_query(grant("refresh_token"))
        .match_body(Matcher::Json(json!({"refresh_token": "rt-1"})))
        .with_status(200)
        .with_body(session_json("at-2", "rt-2", refreshed_until))
        .expect(1)
        .create_async()
        .await;

    assert_eq!(ctx.get("/dashboard").await.status, StatusCode::OK);
    // The refreshed session is valid for an hour; no second refresh.
    assert_eq!(ctx.get("/dashboard").await.status, StatusCode::OK);
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_requests_share_one_refresh() {
    let mut ctx = TestContext::new().await;
    let _sign_in = mock_sign_in(&mut ctx, 10).await;
    assert_eq!(sign_in(&mut ctx).await.status, StatusCode::SEE_OTHER);

    let refreshed_until = Utc::now().timestamp() + 3600;
    let refresh = ctx
        .backend
        .mock("POST", token_path())
        .match_query(grant("refresh_token"))
        .with_status(200)
        .with_body_from_request(move |_| {
            std::thread::sleep(Duration::from_millis(500));
            session_json("at-2", "rt-2", refreshed_until).into_bytes()
        })
        .expect(1)
        .create_async()
        .await;

    let (a, b) = tokio::join!(
        ctx.concurrent_get("/dashboard"),
        ctx.concurrent_get("/dashboard"),
    );

    assert_eq!((a, b), (StatusCode::OK, StatusCode::OK));
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_failed_refresh_signs_out() {
    let mut ctx = TestContext::new().await;
    let _sign_in = mock_sign_in(&mut ctx, 10).await;
    assert_eq!(sign_in(&mut ctx).await.status, StatusCode::SEE_OTHER);

    let refresh = ctx
        .backend
        .mock("POST", token_path())
        .match_query(grant("refresh_token"))
        .with_status(400)
        .with_body(r#"{"error_code":"refresh_token_not_found","msg":"Invalid Refresh Token"}"#)
        .expect(1)
        .create_async()
        .await;

    let response = ctx.get("/dashboard").await;
    assert_eq!(response.location(), Some("/auth/signin"));

    // The stored session was cleared, so no further refresh is attempted.
    let response = ctx.get("/dashboard").await;
    assert_eq!(response.location(), Some("/auth/signin"));
    refresh.assert_async().await;
}

// =============================================================================
// Sign-out and password recovery
// =============================================================================

#[tokio::test]
async fn test_sign_out_revokes_and_clears_session() {
    let mut ctx = TestContext::new().await;
    let _sign_in = mock_sign_in(&mut ctx, 3600).await;
    assert_eq!(sign_in(&mut ctx).await.status, StatusCode::SEE_OTHER);

    let logout = ctx
        .backend
        .mock("POST", "/auth/v1/logout")
        .match_header("authorization", "Bearer at-1")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let response = ctx.post_form("/auth/signout", &[]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
    logout.assert_async().await;

    let dashboard = ctx.get("/dashboard").await;
    assert_eq!(dashboard.location(), Some("/auth/signin"));
}

#[tokio::test]
async fn test_password_reset_does_not_reveal_unknown_accounts() {
    let mut ctx = TestContext::new().await;
    let recover = ctx
        .backend
        .mock("POST", "/auth/v1/recover")
        .match_body(Matcher::Json(json!({"email": "nobody@example.com"})))
        .with_status(404)
        .with_body(r#"{"msg":"User not found"}"#)
        .expect(1)
        .create_async()
        .await;

    let response = ctx
        .post_form("/auth/reset-password", &[("email", "nobody@example.com")])
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.location(),
        Some("/auth/reset-password?notice=reset_sent")
    );
    recover.assert_async().await;

    let page = ctx.get("/auth/reset-password?notice=reset_sent").await;
    assert!(page.body.contains("If an account exists for that email"));
    assert!(!page.body.contains("User not found"));
}
