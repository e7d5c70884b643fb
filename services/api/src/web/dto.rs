//! services/api/src/web/dto.rs
//!
//! JSON request and response bodies. The core crate has no serde; every
//! wire shape lives here and converts from the domain types.

use chrono::{DateTime, Utc};
use reading_list_core::category::CategoryNode;
use reading_list_core::domain::{BookDraft, BookView, Tag, User};
use reading_list_core::tags::{find_color, TagColor};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Books
//=========================================================================================

/// The editable fields of a book.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookPayload {
    pub title: String,
    pub author: String,
    pub asin: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub categories_flat: Option<String>,
    pub description: Option<String>,
    /// 0.0 to 5.0, defaults to 0.0.
    pub rating: Option<f64>,
    pub isbn_13: Option<String>,
    pub isbn_10: Option<String>,
    pub hardcover: Option<String>,
    pub bestsellers_rank_flat: Option<String>,
    pub specifications_flat: Option<String>,
}

impl From<BookPayload> for BookDraft {
    fn from(p: BookPayload) -> Self {
        BookDraft {
            title: p.title,
            author: p.author,
            asin: p.asin,
            link: p.link,
            image: p.image,
            categories_flat: p.categories_flat,
            description: p.description,
            rating: p.rating.unwrap_or(0.0),
            isbn_13: p.isbn_13,
            isbn_10: p.isbn_10,
            hardcover: p.hardcover,
            bestsellers_rank_flat: p.bestsellers_rank_flat,
            specifications_flat: p.specifications_flat,
        }
    }
}

/// A book as seen by the viewer: catalog fields plus their own status, feedback and tags.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub asin: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub categories_flat: Option<String>,
    pub description: Option<String>,
    pub rating: f64,
    pub isbn_13: Option<String>,
    pub isbn_10: Option<String>,
    pub hardcover: Option<String>,
    pub bestsellers_rank_flat: Option<String>,
    pub specifications_flat: Option<String>,
    /// `up_next` or `read`; absent when unset or anonymous.
    pub status: Option<String>,
    /// `like` or `dislike`; absent when unset or anonymous.
    pub feedback: Option<String>,
    pub tags: Vec<TagResponse>,
}

impl From<BookView> for BookResponse {
    fn from(view: BookView) -> Self {
        let book = view.book;
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            asin: book.asin,
            link: book.link,
            image: book.image,
            categories_flat: book.categories_flat,
            description: book.description,
            rating: book.rating,
            isbn_13: book.isbn_13,
            isbn_10: book.isbn_10,
            hardcover: book.hardcover,
            bestsellers_rank_flat: book.bestsellers_rank_flat,
            specifications_flat: book.specifications_flat,
            status: view.status.map(|s| s.as_str().to_string()),
            feedback: view.feedback.map(|f| f.as_str().to_string()),
            tags: view.tags.into_iter().map(TagResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusRequest {
    /// `up_next`, `read` or `none` to clear.
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackRequest {
    /// `like`, `dislike` or `none` to clear.
    pub feedback: String,
}

/// Query string of `GET /search`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Author substring, or `*` for every book.
    pub author: Option<String>,
    /// Title substring, or `*` for every book.
    pub title: Option<String>,
    /// Category node ids; repeat the parameter to select several.
    #[serde(default)]
    pub cat: Vec<String>,
    /// `up_next`, `read` or `none`. Ignored for anonymous viewers.
    pub status: Option<String>,
    /// `like`, `dislike` or `none`. Ignored for anonymous viewers.
    pub feedback: Option<String>,
    /// Ids of the viewer's tags; a book matches if it carries any of them.
    #[serde(default)]
    pub tag: Vec<Uuid>,
    /// `title`, `author` or `rating`.
    #[serde(rename = "sortColumn")]
    pub sort_column: Option<String>,
    /// `asc` or `desc`.
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

/// Query string of `GET /library_searches`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LibraryParams {
    pub author: Option<String>,
    pub title: Option<String>,
}

/// Query string of `GET /categories`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryParams {
    /// Node ids to mark as checked.
    #[serde(default)]
    pub cat: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryNodeResponse {
    pub text: String,
    pub full_path: String,
    pub id: String,
    pub checked: bool,
    #[schema(value_type = Vec<Object>)]
    pub nodes: Vec<CategoryNodeResponse>,
}

impl From<CategoryNode> for CategoryNodeResponse {
    fn from(node: CategoryNode) -> Self {
        Self {
            text: node.text,
            full_path: node.full_path,
            id: node.id,
            checked: node.checked,
            nodes: node.nodes.into_iter().map(Self::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

//=========================================================================================
// Tags
//=========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    /// Hex background and foreground of the palette entry.
    pub background: Option<String>,
    pub foreground: Option<String>,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        let palette = find_color(&tag.color);
        Self {
            id: tag.id,
            name: tag.name,
            background: palette.map(|c| c.color.to_string()),
            foreground: palette.map(|c| c.contrast_color.to_string()),
            color: tag.color,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TagColorResponse {
    pub name: String,
    pub color: String,
    pub contrast_color: String,
}

impl From<&TagColor> for TagColorResponse {
    fn from(c: &TagColor) -> Self {
        Self {
            name: c.name.to_string(),
            color: c.color.to_string(),
            contrast_color: c.contrast_color.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TagBookRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTagRequest {
    pub name: String,
    /// A palette color name, see `GET /tags/colors`.
    pub color: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TagQuery {
    /// Case-insensitive substring for autocomplete.
    pub q: Option<String>,
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            roles: user.roles.iter().map(|r| r.as_str().to_string()).collect(),
            active: user.active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
    /// Any of `admin`, `editor`.
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub roles: Vec<String>,
    pub active: bool,
}
