pub mod admin;
pub mod auth;
pub mod books;
pub mod dto;
pub mod extract;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod tags;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use reading_list_core::ports::PortError;
use reading_list_core::validation::ValidationError;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

pub use middleware::{require_auth, resolve_session};
pub use state::AppState;

/// The error half of every handler's return type.
pub type HandlerError = (StatusCode, String);

/// Maps a port failure onto an HTTP status. Only unexpected failures are
/// logged; their detail never reaches the client.
pub fn port_error(action: &'static str) -> impl Fn(PortError) -> HandlerError {
    move |e| match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        PortError::Invalid(v) => (StatusCode::BAD_REQUEST, v.to_string()),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Login required".to_string()),
        PortError::Unexpected(detail) => {
            error!("Failed to {}: {}", action, detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {}", action),
            )
        }
    }
}

pub fn bad_request(e: ValidationError) -> HandlerError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

/// Builds every API route on top of the given state.
///
/// CORS and the Swagger UI are left to the binary.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required). Handlers on `/books/{id}` that need a
    // user take the `CurrentUser` extractor, which answers 401 itself.
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/health", get(books::health_handler))
        .route("/categories", get(books::categories_handler))
        .route("/search", get(books::search_handler))
        .route("/library_searches", get(books::library_searches_handler))
        .route(
            "/books/{id}",
            get(books::get_book_handler)
                .put(books::edit_book_handler)
                .delete(books::delete_book_handler),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/books", post(books::add_book_handler))
        .route("/books/{id}/status", put(books::set_status_handler))
        .route("/books/{id}/feedback", put(books::set_feedback_handler))
        .route(
            "/books/{id}/tags",
            get(tags::book_tags_handler).post(tags::tag_book_handler),
        )
        .route(
            "/books/{id}/tags/{name}",
            axum::routing::delete(tags::untag_book_handler),
        )
        .route("/tags", get(tags::list_tags_handler))
        .route("/tags/colors", get(tags::colors_handler))
        .route(
            "/tags/{id}",
            put(tags::update_tag_handler).delete(tags::delete_tag_handler),
        )
        .route(
            "/admin/users",
            get(admin::list_users_handler).post(admin::register_user_handler),
        )
        .route(
            "/admin/users/{id}",
            put(admin::update_user_handler).delete(admin::delete_user_handler),
        )
        .layer(axum_middleware::from_fn(require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            resolve_session,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
