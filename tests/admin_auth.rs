mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use common::{TestApp, ADMIN_PASSWORD, ADMIN_USERNAME, SECRET};
use serde_json::json;

async fn login_with(app: &TestApp, username: &str, password: &str) -> Result<(StatusCode, serde_json::Value)> {
    app.call(
        Method::POST,
        "/auth/admin/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

#[tokio::test]
async fn login_returns_token_and_profile() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = login_with(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Login berhasil");
    assert_eq!(body["data"]["expiresIn"], 3600);
    assert_eq!(body["data"]["user"]["username"], ADMIN_USERNAME);
    assert_eq!(body["data"]["user"]["role"], "admin");

    let token = body["data"]["accessToken"].as_str().unwrap_or_default();

    let (status, body) = app
        .call(Method::GET, "/auth/admin/verify", Some(token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Token valid");
    assert_eq!(body["data"]["username"], ADMIN_USERNAME);
    assert_eq!(body["data"]["role"], "admin");

    let (status, body) = app
        .call(Method::GET, "/auth/admin/profile", Some(token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "admin@example.com");
    assert!(body["data"]["createdAt"].is_string());

    let (status, body) = app
        .call(Method::POST, "/auth/admin/logout", Some(token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Logout berhasil. Hapus token dari localStorage/cookie Anda."
    );
    Ok(())
}

#[tokio::test]
async fn wrong_credentials_are_unauthorized() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = login_with(&app, ADMIN_USERNAME, "wrong-password").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Password tidak sesuai");

    let (status, body) = login_with(&app, "nobody", ADMIN_PASSWORD).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Username tidak ditemukan");
    Ok(())
}

#[tokio::test]
async fn sixth_attempt_is_locked_even_with_correct_password() -> Result<()> {
    let app = TestApp::new();

    for _ in 0..5 {
        let (status, _) = login_with(&app, ADMIN_USERNAME, "wrong-password").await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = login_with(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"]
        .as_str()
        .is_some_and(|message| message.starts_with("Akun terkunci")));
    assert!(body["message"]
        .as_str()
        .is_some_and(|message| message.contains("15 menit")));
    Ok(())
}

#[tokio::test]
async fn success_resets_failure_count() -> Result<()> {
    let app = TestApp::new();

    for _ in 0..4 {
        login_with(&app, ADMIN_USERNAME, "wrong-password").await?;
    }
    let (status, _) = login_with(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);

    // Four more failures would have locked the account without the reset.
    for _ in 0..4 {
        login_with(&app, ADMIN_USERNAME, "wrong-password").await?;
    }
    let (status, _) = login_with(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn non_admin_user_is_forbidden() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = login_with(&app, "surveyor", "userpass123").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "User ini bukan admin");
    Ok(())
}

#[tokio::test]
async fn login_input_is_validated() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = login_with(&app, "ab", ADMIN_PASSWORD).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username minimal 3 karakter");

    let (status, body) = login_with(&app, ADMIN_USERNAME, "123").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Password minimal 6 karakter");
    Ok(())
}

#[tokio::test]
async fn guard_rejects_missing_malformed_and_invalid_tokens() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app
        .call(Method::GET, "/auth/admin/verify", None, None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token tidak ditemukan");

    let request = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/auth/admin/verify")
        .header(axum::http::header::AUTHORIZATION, "Token abc")
        .body(axum::body::Body::empty())?;
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(Method::GET, "/auth/admin/verify", Some("not-a-jwt"), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token tidak valid atau kadaluarsa");
    Ok(())
}

#[tokio::test]
async fn guard_rejects_valid_token_without_admin_role() -> Result<()> {
    let app = TestApp::new();

    let token = tautan::token::sign(
        &json!({ "userId": 2, "username": "surveyor", "role": "user" }),
        SECRET.as_bytes(),
        60,
    )?;

    let (status, body) = app
        .call(Method::GET, "/auth/admin/verify", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Hanya admin yang dapat mengakses resource ini");
    Ok(())
}

#[tokio::test]
async fn missing_secret_is_a_server_error_not_an_auth_failure() -> Result<()> {
    let mut settings = common::settings();
    settings.auth = tautan::auth::AuthConfig::new();
    let app = TestApp::with_settings(&settings);

    let (status, body) = login_with(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn health_and_openapi_are_served() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
    assert_eq!(body["name"], "tautan");

    let (status, body) = app.call(Method::GET, "/openapi.json", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/link/get-form"].is_object());
    Ok(())
}
