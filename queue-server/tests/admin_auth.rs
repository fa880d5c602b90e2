//! 管理员登录与会话校验

mod common;

use common::{ADMIN_PASS, ADMIN_USER, TestApp};
use http::StatusCode;
use jsonwebtoken::{EncodingKey, Header, encode};
use queue_server::auth::Claims;
use queue_server::db::repository::admin;
use serde_json::json;

#[tokio::test]
async fn test_login_and_me() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/admin/login",
            json!({ "username": ADMIN_USER, "password": ADMIN_PASS }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admin"]["username"], ADMIN_USER);
    assert!(body["admin"].get("password_hash").is_none());
    assert!(body["expires_at"].as_i64().unwrap() > chrono::Utc::now().timestamp());

    let token = body["token"].as_str().unwrap();
    let (status, me) = app.get("/api/admin/me", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], ADMIN_USER);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/admin/login",
            json!({ "username": ADMIN_USER, "password": "wrong" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);

    // 未知用户与错误密码返回同样的错误
    let (status, unknown) = app
        .post_json(
            "/api/admin/login",
            json!({ "username": "ghost", "password": ADMIN_PASS }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown["message"], body["message"]);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/admin/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, body) = app.get("/api/admin/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1004);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = TestApp::new().await;
    let jwt = &app.state.config.jwt;
    let now = chrono::Utc::now().timestamp();

    let claims = Claims {
        sub: "1".into(),
        username: ADMIN_USER.into(),
        exp: now - 600,
        iat: now - 1200,
        iss: jwt.issuer.clone(),
        aud: jwt.audience.clone(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )
    .unwrap();

    let (status, body) = app.get("/api/admin/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1003);
}

#[tokio::test]
async fn test_deleted_admin_session_expires() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let row = admin::find_by_username(&app.state.pool, ADMIN_USER)
        .await
        .unwrap()
        .unwrap();
    assert!(admin::delete(&app.state.pool, row.id).await.unwrap());

    let (status, body) = app.get("/api/admin/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1005);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "ok");
}
