//! Shared test utilities for integration tests.
//!
//! Every test builds the real router over a fresh `MemoryAdapter` seeded with
//! three users. Sessions are created straight in the store so that only the
//! auth tests pay for Argon2.

#![allow(dead_code)]

use api_lib::{
    adapters::MemoryAdapter,
    config::Config,
    web::{auth::hash_password, router, state::AppState},
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use reading_list_core::domain::{BookDraft, NewUser, Role};
use reading_list_core::ports::DatabaseService;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse battery";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const EDITOR_EMAIL: &str = "editor@example.com";
pub const READER_EMAIL: &str = "reader@example.com";

fn shared_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap()).clone()
}

/// A signed-in test user.
pub struct TestUser {
    pub id: Uuid,
    pub cookie: String,
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<MemoryAdapter>,
    pub admin: TestUser,
    pub editor: TestUser,
    pub reader: TestUser,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::new_for_test()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let db = Arc::new(MemoryAdapter::new());
        let state = Arc::new(AppState {
            db: db.clone(),
            config: Arc::new(config),
        });
        let router = router(state);

        let admin = seed_user(&db, ADMIN_EMAIL, vec![Role::Admin, Role::Editor]).await;
        let editor = seed_user(&db, EDITOR_EMAIL, vec![Role::Editor]).await;
        let reader = seed_user(&db, READER_EMAIL, vec![]).await;

        Self {
            router,
            db,
            admin,
            editor,
            reader,
        }
    }

    /// Sends a request and returns the status and the JSON body (`Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.raw(method, uri, cookie, body).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn raw(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, cookie, None).await
    }

    /// Inserts a book directly, bypassing the editor endpoint.
    pub async fn book(&self, title: &str, author: &str, categories: &str, rating: f64) -> Uuid {
        self.db
            .create_book(BookDraft {
                title: title.to_string(),
                author: author.to_string(),
                categories_flat: Some(categories.to_string()),
                rating,
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }
}

async fn seed_user(db: &MemoryAdapter, email: &str, roles: Vec<Role>) -> TestUser {
    let user = db
        .create_user(NewUser {
            email: email.to_string(),
            hashed_password: shared_hash(),
            roles,
        })
        .await
        .unwrap();
    let session_id = Uuid::new_v4().to_string();
    db.create_auth_session(&session_id, user.id, Utc::now() + Duration::days(1))
        .await
        .unwrap();
    TestUser {
        id: user.id,
        cookie: format!("session={}", session_id),
    }
}

/// Titles of a JSON array of books, in order.
pub fn titles(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect()
}
