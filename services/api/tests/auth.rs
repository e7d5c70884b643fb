mod common;

use axum::http::{header, Method, StatusCode};
use api_lib::config::Config;
use common::{TestApp, PASSWORD, READER_EMAIL};
use reading_list_core::ports::DatabaseService;
use serde_json::json;

fn session_from(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn login_sets_a_cookie_that_identifies_the_user() {
    let app = TestApp::new().await;

    let response = app
        .raw(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "Reader@Example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_from(&response);

    let (status, me) = app.get("/auth/me", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], READER_EMAIL);
    assert_eq!(me["roles"], json!([]));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": READER_EMAIL, "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status2, body2) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status2, StatusCode::UNAUTHORIZED);
    assert_eq!(body, body2);
}

#[tokio::test]
async fn deactivated_users_cannot_log_in_or_keep_sessions() {
    let app = TestApp::new().await;
    app.db
        .update_user(app.reader.id, vec![], false)
        .await
        .unwrap();

    let (status, _) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": READER_EMAIL, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/auth/me", Some(&app.reader.cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = TestApp::new().await;

    let response = app
        .raw(Method::POST, "/auth/logout", Some(&app.reader.cookie), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let (status, _) = app.get("/auth/me", Some(&app.reader.cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // logging out twice is harmless
    let (status, _) = app
        .send(Method::POST, "/auth/logout", Some(&app.reader.cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = TestApp::new().await;

    for uri in ["/auth/me", "/tags", "/tags/colors", "/admin/users"] {
        let (status, _) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        let (status, _) = app.get(uri, Some("session=forged")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    // public routes stay reachable with a stale cookie
    let (status, body) = app.get("/health", Some("session=forged")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unrepresentable_session_ttl_fails_the_login_cleanly() {
    let mut config = Config::new_for_test();
    config.session_ttl_days = i64::MAX;
    let app = TestApp::with_config(config).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": READER_EMAIL, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Session error");
}
