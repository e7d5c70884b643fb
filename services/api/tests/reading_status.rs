mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn status_and_feedback_are_set_and_cleared() {
    let app = TestApp::new().await;
    let book = app.book("Dune", "Herbert", "Fiction", 4.0).await;
    let reader = Some(app.reader.cookie.as_str());

    let (status, view) = app
        .send(
            Method::PUT,
            &format!("/books/{}/status", book),
            reader,
            Some(json!({ "status": "up_next" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "up_next");

    let (_, view) = app
        .send(
            Method::PUT,
            &format!("/books/{}/feedback", book),
            reader,
            Some(json!({ "feedback": "dislike" })),
        )
        .await;
    assert_eq!(view["status"], "up_next");
    assert_eq!(view["feedback"], "dislike");

    let (_, details) = app.get(&format!("/books/{}", book), reader).await;
    assert_eq!(details["feedback"], "dislike");
    let (_, anonymous) = app.get(&format!("/books/{}", book), None).await;
    assert!(anonymous["feedback"].is_null());

    let (_, view) = app
        .send(
            Method::PUT,
            &format!("/books/{}/status", book),
            reader,
            Some(json!({ "status": "none" })),
        )
        .await;
    assert!(view["status"].is_null());
    assert_eq!(view["feedback"], "dislike");
}

#[tokio::test]
async fn bad_values_missing_books_and_anonymous_callers_are_rejected() {
    let app = TestApp::new().await;
    let book = app.book("Dune", "Herbert", "Fiction", 4.0).await;
    let reader = Some(app.reader.cookie.as_str());

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/books/{}/status", book),
            reader,
            Some(json!({ "status": "finished" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.as_str().unwrap().contains("finished"));

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/books/{}/feedback", Uuid::new_v4()),
            reader,
            Some(json!({ "feedback": "none" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/books/{}/status", book),
            None,
            Some(json!({ "status": "read" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rapid_updates_leave_exactly_one_status() {
    let app = Arc::new(TestApp::new().await);
    let book = app.book("Dune", "Herbert", "Fiction", 4.0).await;

    let handles: Vec<_> = (0..24)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let value = if i % 2 == 0 { "read" } else { "up_next" };
                app.send(
                    Method::PUT,
                    &format!("/books/{}/status", book),
                    Some(&app.reader.cookie),
                    Some(json!({ "status": value })),
                )
                .await
                .0
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let (_, body) = app.get("/search?title=*", Some(&app.reader.cookie)).await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 1);
    let status = results[0]["status"].as_str().unwrap();
    assert!(status == "read" || status == "up_next");

    let (_, read) = app.get("/search?title=*&status=read", Some(&app.reader.cookie)).await;
    let (_, up_next) = app
        .get("/search?title=*&status=up_next", Some(&app.reader.cookie))
        .await;
    let total = read.as_array().unwrap().len() + up_next.as_array().unwrap().len();
    assert_eq!(total, 1);
}
