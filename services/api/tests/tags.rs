mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{json, Value};

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn tagging_by_name_creates_lowercase_tags_once() {
    let app = TestApp::new().await;
    let book = app.book("Dune", "Herbert", "Fiction", 4.0).await;
    let uri = format!("/books/{}/tags", book);
    let cookie = Some(app.reader.cookie.as_str());

    let (status, tags) = app
        .send(Method::POST, &uri, cookie, Some(json!({ "name": " <em>Sci-Fi</em> Faves " })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&tags), vec!["sci-fi faves"]);
    assert!(tags[0]["background"].as_str().unwrap().starts_with('#'));

    let (_, again) = app
        .send(Method::POST, &uri, cookie, Some(json!({ "name": "SCI-FI FAVES" })))
        .await;
    assert_eq!(again, tags);

    let (_, tags) = app
        .send(Method::POST, &uri, cookie, Some(json!({ "name": "reread" })))
        .await;
    assert_eq!(names(&tags), vec!["sci-fi faves", "reread"]);

    let (_, listed) = app.get(&uri, cookie).await;
    assert_eq!(listed, tags);
}

#[tokio::test]
async fn invalid_names_and_unknown_books_are_rejected() {
    let app = TestApp::new().await;
    let book = app.book("Dune", "Herbert", "Fiction", 4.0).await;
    let cookie = Some(app.reader.cookie.as_str());

    let too_long = "x".repeat(33);
    for name in ["", "<b></b>", "no_underscores", too_long.as_str()] {
        let (status, _) = app
            .send(
                Method::POST,
                &format!("/books/{}/tags", book),
                cookie,
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{:?}", name);
    }

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/books/{}/tags", uuid::Uuid::new_v4()),
            cookie,
            Some(json!({ "name": "ok" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn untagging_returns_the_remaining_tags() {
    let app = TestApp::new().await;
    let book = app.book("Dune", "Herbert", "Fiction", 4.0).await;
    let cookie = Some(app.reader.cookie.as_str());
    for name in ["first", "second pick"] {
        app.send(
            Method::POST,
            &format!("/books/{}/tags", book),
            cookie,
            Some(json!({ "name": name })),
        )
        .await;
    }

    let (status, tags) = app
        .send(
            Method::DELETE,
            &format!("/books/{}/tags/Second%20Pick", book),
            cookie,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&tags), vec!["first"]);

    // removing a tag that was never applied is not an error
    let (status, tags) = app
        .send(Method::DELETE, &format!("/books/{}/tags/never", book), cookie, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&tags), vec!["first"]);

    // the tag itself still exists
    let (_, all) = app.get("/tags", cookie).await;
    assert_eq!(names(&all), vec!["first", "second pick"]);
}

#[tokio::test]
async fn listing_and_autocomplete_are_per_user() {
    let app = TestApp::new().await;
    let book = app.book("Dune", "Herbert", "Fiction", 4.0).await;
    for (cookie, name) in [
        (&app.reader.cookie, "zebra"),
        (&app.reader.cookie, "Alpha"),
        (&app.reader.cookie, "alphabet"),
        (&app.editor.cookie, "alpine"),
    ] {
        app.send(
            Method::POST,
            &format!("/books/{}/tags", book),
            Some(cookie),
            Some(json!({ "name": name })),
        )
        .await;
    }

    let (_, all) = app.get("/tags", Some(&app.reader.cookie)).await;
    assert_eq!(names(&all), vec!["zebra", "alpha", "alphabet"]);

    let (_, found) = app.get("/tags?q=ALP", Some(&app.reader.cookie)).await;
    assert_eq!(names(&found), vec!["alpha", "alphabet"]);

    let (_, found) = app.get("/tags?q=alp", Some(&app.editor.cookie)).await;
    assert_eq!(names(&found), vec!["alpine"]);

    // book tags are private to their owner
    let (_, on_book) = app
        .get(&format!("/books/{}/tags", book), Some(&app.editor.cookie))
        .await;
    assert_eq!(names(&on_book), vec!["alpine"]);
}

#[tokio::test]
async fn owners_rename_recolor_and_delete_their_tags() {
    let app = TestApp::new().await;
    let book = app.book("Dune", "Herbert", "Fiction", 4.0).await;
    let reader = Some(app.reader.cookie.as_str());
    let (_, tags) = app
        .send(
            Method::POST,
            &format!("/books/{}/tags", book),
            reader,
            Some(json!({ "name": "old" })),
        )
        .await;
    let tag_uri = format!("/tags/{}", tags[0]["id"].as_str().unwrap());

    let (status, _) = app
        .send(
            Method::PUT,
            &tag_uri,
            Some(&app.editor.cookie),
            Some(json!({ "name": "hijacked", "color": "plum" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::PUT,
            &tag_uri,
            reader,
            Some(json!({ "name": "new", "color": "chartreuse-ish" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .send(Method::PUT, &tag_uri, reader, Some(json!({ "name": "New", "color": "plum" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "new");
    assert_eq!(updated["color"], "plum");

    let (status, _) = app.send(Method::DELETE, &tag_uri, Some(&app.editor.cookie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(Method::DELETE, &tag_uri, reader, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, on_book) = app.get(&format!("/books/{}/tags", book), reader).await;
    assert_eq!(on_book, json!([]));
    let (status, _) = app.send(Method::DELETE, &tag_uri, reader, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn renaming_onto_an_existing_name_conflicts() {
    let app = TestApp::new().await;
    let book = app.book("Dune", "Herbert", "Fiction", 4.0).await;
    let reader = Some(app.reader.cookie.as_str());
    let mut ids = Vec::new();
    for name in ["one", "two"] {
        let (_, tags) = app
            .send(
                Method::POST,
                &format!("/books/{}/tags", book),
                reader,
                Some(json!({ "name": name })),
            )
            .await;
        ids.push(tags.as_array().unwrap().last().unwrap()["id"].as_str().unwrap().to_string());
    }

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/tags/{}", ids[1]),
            reader,
            Some(json!({ "name": "one", "color": "plum" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn palette_is_listed() {
    let app = TestApp::new().await;
    let (status, colors) = app.get("/tags/colors", Some(&app.reader.cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let colors = colors.as_array().unwrap();
    assert_eq!(colors.len(), 20);
    assert!(colors.iter().any(|c| c["name"] == "plum"));
}
