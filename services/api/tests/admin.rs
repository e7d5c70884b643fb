mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, ADMIN_EMAIL, READER_EMAIL};
use serde_json::json;

#[tokio::test]
async fn admins_register_users_who_can_then_log_in() {
    let app = TestApp::new().await;
    let admin = Some(app.admin.cookie.as_str());

    let (status, user) = app
        .send(
            Method::POST,
            "/admin/users",
            admin,
            Some(json!({
                "email": " new@example.com ",
                "password": "longenough",
                "roles": ["editor"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "new@example.com");
    assert_eq!(user["roles"], json!(["editor"]));
    assert_eq!(user["active"], true);

    let (status, _) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "new@example.com", "password": "longenough" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn registration_validates_input() {
    let app = TestApp::new().await;
    let admin = Some(app.admin.cookie.as_str());

    let cases = [
        json!({ "email": "not-an-email", "password": "longenough" }),
        json!({ "email": "ok@example.com", "password": "short" }),
        json!({ "email": "ok@example.com", "password": "longenough", "roles": ["owner"] }),
    ];
    for body in cases {
        let (status, _) = app
            .send(Method::POST, "/admin/users", admin, Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    }

    let (status, _) = app
        .send(
            Method::POST,
            "/admin/users",
            admin,
            Some(json!({ "email": READER_EMAIL.to_uppercase(), "password": "longenough" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let app = TestApp::new().await;

    for cookie in [&app.editor.cookie, &app.reader.cookie] {
        let (status, _) = app.get("/admin/users", Some(cookie)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app
            .send(
                Method::DELETE,
                &format!("/admin/users/{}", app.admin.id),
                Some(cookie),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn admins_list_update_and_delete_users() {
    let app = TestApp::new().await;
    let admin = Some(app.admin.cookie.as_str());

    let (status, users) = app.get("/admin/users", admin).await;
    assert_eq!(status, StatusCode::OK);
    let emails: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec![ADMIN_EMAIL, "editor@example.com", READER_EMAIL]);

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/admin/users/{}", app.reader.id),
            admin,
            Some(json!({ "roles": ["editor"], "active": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["roles"], json!(["editor"]));

    // the promotion applies to the reader's existing session
    let (status, _) = app
        .send(
            Method::POST,
            "/books",
            Some(&app.reader.cookie),
            Some(json!({ "title": "T", "author": "A" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .send(Method::DELETE, &format!("/admin/users/{}", app.reader.id), admin, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get("/auth/me", Some(&app.reader.cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .send(Method::DELETE, &format!("/admin/users/{}", app.reader.id), admin, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admins_cannot_lock_themselves_out() {
    let app = TestApp::new().await;
    let admin = Some(app.admin.cookie.as_str());
    let uri = format!("/admin/users/{}", app.admin.id);

    let (status, _) = app
        .send(Method::PUT, &uri, admin, Some(json!({ "roles": ["editor"], "active": true })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.send(Method::DELETE, &uri, admin, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
