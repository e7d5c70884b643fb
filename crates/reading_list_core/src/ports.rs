//! crates/reading_list_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Book, BookDraft, BookView, Feedback, NewUser, ReadingStatus, Role, Tag, User, UserCredentials,
};
use crate::search::SearchQuery;
use crate::validation::ValidationError;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    /// Cheap round trip used by the health endpoint.
    async fn ping(&self) -> PortResult<()>;

    // --- User Management ---
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    /// Email lookup is case-insensitive.
    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn list_users(&self) -> PortResult<Vec<User>>;

    async fn update_user(&self, user_id: Uuid, roles: Vec<Role>, active: bool) -> PortResult<User>;

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()>;

    // --- Auth Methods ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user, or `Unauthorized` for unknown or expired sessions.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Catalog ---
    async fn create_book(&self, draft: BookDraft) -> PortResult<Book>;

    async fn update_book(&self, book_id: Uuid, draft: BookDraft) -> PortResult<Book>;

    /// Removes the book together with every status, feedback and tag link on it.
    async fn delete_book(&self, book_id: Uuid) -> PortResult<()>;

    async fn get_book(&self, book_id: Uuid) -> PortResult<Book>;

    /// The book plus the viewer's status, feedback and tags.
    async fn get_book_view(&self, book_id: Uuid, viewer: Option<Uuid>) -> PortResult<BookView>;

    /// Distinct, non-empty category paths across all books.
    async fn list_category_paths(&self) -> PortResult<Vec<String>>;

    async fn search_books(&self, query: &SearchQuery) -> PortResult<Vec<BookView>>;

    // --- Per-user attributes ---
    /// `None` clears the status. At most one status exists per (user, book).
    async fn set_reading_status(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        status: Option<ReadingStatus>,
    ) -> PortResult<()>;

    /// `None` clears the feedback. At most one feedback exists per (user, book).
    async fn set_feedback(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        feedback: Option<Feedback>,
    ) -> PortResult<()>;

    // --- Tags ---
    /// `name` must already be normalized. `color` is used only when creating.
    async fn get_or_create_tag(&self, owner_id: Uuid, name: &str, color: &str) -> PortResult<Tag>;

    async fn find_tag(&self, owner_id: Uuid, name: &str) -> PortResult<Option<Tag>>;

    async fn get_tag(&self, tag_id: Uuid) -> PortResult<Tag>;

    /// Owner's tags in creation order.
    async fn list_user_tags(&self, owner_id: Uuid) -> PortResult<Vec<Tag>>;

    /// Owner's tags whose name contains `q` (case-insensitive), by lowercase name.
    async fn autocomplete_tags(&self, owner_id: Uuid, q: &str) -> PortResult<Vec<Tag>>;

    async fn update_tag(&self, tag_id: Uuid, name: &str, color: &str) -> PortResult<Tag>;

    async fn delete_tag(&self, tag_id: Uuid) -> PortResult<()>;

    /// Links the tag to the book; linking twice is a no-op.
    async fn tag_book(&self, tag_id: Uuid, book_id: Uuid) -> PortResult<()>;

    async fn untag_book(&self, tag_id: Uuid, book_id: Uuid) -> PortResult<()>;

    /// The owner's tags on a book, in the order they were applied.
    async fn tags_for_book(&self, owner_id: Uuid, book_id: Uuid) -> PortResult<Vec<Tag>>;
}
