//! services/api/src/web/rest.rs
//!
//! The master definition of the OpenAPI document. The handlers themselves
//! live in the `auth`, `books`, `tags` and `admin` modules.

use utoipa::OpenApi;

use crate::web::dto::{
    BookPayload, BookResponse, CategoryNodeResponse, FeedbackRequest, HealthResponse,
    LoginRequest, RegisterUserRequest, StatusRequest, TagBookRequest, TagColorResponse,
    TagResponse, UpdateTagRequest, UpdateUserRequest, UserResponse,
};
use crate::web::{admin, auth, books, tags};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        books::health_handler,
        books::categories_handler,
        books::search_handler,
        books::library_searches_handler,
        books::get_book_handler,
        books::add_book_handler,
        books::edit_book_handler,
        books::delete_book_handler,
        books::set_status_handler,
        books::set_feedback_handler,
        tags::book_tags_handler,
        tags::tag_book_handler,
        tags::untag_book_handler,
        tags::list_tags_handler,
        tags::colors_handler,
        tags::update_tag_handler,
        tags::delete_tag_handler,
        admin::list_users_handler,
        admin::register_user_handler,
        admin::update_user_handler,
        admin::delete_user_handler,
    ),
    components(
        schemas(
            BookPayload,
            BookResponse,
            CategoryNodeResponse,
            FeedbackRequest,
            HealthResponse,
            LoginRequest,
            RegisterUserRequest,
            StatusRequest,
            TagBookRequest,
            TagColorResponse,
            TagResponse,
            UpdateTagRequest,
            UpdateUserRequest,
            UserResponse,
        )
    ),
    tags(
        (name = "Reading List API", description = "Book catalog with personal reading status, feedback and tags.")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/search",
            "/books/{id}",
            "/books/{id}/tags/{name}",
            "/tags/colors",
            "/admin/users/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
