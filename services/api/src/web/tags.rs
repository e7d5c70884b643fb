//! services/api/src/web/tags.rs
//!
//! Personal tags: tagging books by name, listing and autocompleting the
//! viewer's tags, and owner-only rename, recolor and delete.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use reading_list_core::domain::Tag;
use reading_list_core::tags::{normalize_tag_name, random_color, validate_color, TAG_COLORS};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::web::dto::{TagBookRequest, TagColorResponse, TagQuery, TagResponse, UpdateTagRequest};
use crate::web::extract::CurrentUser;
use crate::web::state::AppState;
use crate::web::{bad_request, port_error, HandlerError};

async fn current_tags(
    state: &AppState,
    owner_id: Uuid,
    book_id: Uuid,
) -> Result<Json<Vec<TagResponse>>, HandlerError> {
    let tags = state
        .db
        .tags_for_book(owner_id, book_id)
        .await
        .map_err(port_error("list book tags"))?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

/// Loads a tag, answering 404 for missing tags and 403 for other users' tags.
async fn owned_tag(
    state: &AppState,
    user: &CurrentUser,
    tag_id: Uuid,
) -> Result<Tag, HandlerError> {
    let tag = state
        .db
        .get_tag(tag_id)
        .await
        .map_err(port_error("load tag"))?;
    if tag.owner_id != user.id {
        return Err((StatusCode::FORBIDDEN, "Not your tag".to_string()));
    }
    Ok(tag)
}

/// GET /books/{id}/tags - The viewer's tags on a book
#[utoipa::path(
    get,
    path = "/books/{id}/tags",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 200, description = "Tags in the order they were applied", body = [TagResponse]),
        (status = 404, description = "No such book")
    )
)]
pub async fn book_tags_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(book_id): Path<Uuid>,
) -> Result<Json<Vec<TagResponse>>, HandlerError> {
    state
        .db
        .get_book(book_id)
        .await
        .map_err(port_error("load book"))?;
    current_tags(&state, user.id, book_id).await
}

/// POST /books/{id}/tags - Tag a book by name, creating the tag if needed
#[utoipa::path(
    post,
    path = "/books/{id}/tags",
    params(("id" = Uuid, Path, description = "Book id")),
    request_body = TagBookRequest,
    responses(
        (status = 200, description = "The book's tags after tagging", body = [TagResponse]),
        (status = 400, description = "Invalid tag name"),
        (status = 404, description = "No such book")
    )
)]
pub async fn tag_book_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(book_id): Path<Uuid>,
    Json(req): Json<TagBookRequest>,
) -> Result<Json<Vec<TagResponse>>, HandlerError> {
    let name = normalize_tag_name(&req.name).map_err(bad_request)?;
    state
        .db
        .get_book(book_id)
        .await
        .map_err(port_error("load book"))?;
    let tag = state
        .db
        .get_or_create_tag(user.id, &name, random_color())
        .await
        .map_err(port_error("create tag"))?;
    state
        .db
        .tag_book(tag.id, book_id)
        .await
        .map_err(port_error("tag book"))?;
    info!(tag_id = %tag.id, book_id = %book_id, "Book tagged");
    current_tags(&state, user.id, book_id).await
}

/// DELETE /books/{id}/tags/{name} - Remove a tag from a book
#[utoipa::path(
    delete,
    path = "/books/{id}/tags/{name}",
    params(
        ("id" = Uuid, Path, description = "Book id"),
        ("name" = String, Path, description = "Tag name")
    ),
    responses(
        (status = 200, description = "The book's remaining tags", body = [TagResponse]),
        (status = 400, description = "Invalid tag name"),
        (status = 404, description = "No such book")
    )
)]
pub async fn untag_book_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((book_id, raw_name)): Path<(Uuid, String)>,
) -> Result<Json<Vec<TagResponse>>, HandlerError> {
    let name = normalize_tag_name(&raw_name).map_err(bad_request)?;
    state
        .db
        .get_book(book_id)
        .await
        .map_err(port_error("load book"))?;
    let tag = state
        .db
        .find_tag(user.id, &name)
        .await
        .map_err(port_error("load tag"))?;
    if let Some(tag) = tag {
        state
            .db
            .untag_book(tag.id, book_id)
            .await
            .map_err(port_error("untag book"))?;
    }
    current_tags(&state, user.id, book_id).await
}

/// GET /tags - The viewer's tags, or autocomplete matches when `q` is given
#[utoipa::path(
    get,
    path = "/tags",
    params(TagQuery),
    responses(
        (status = 200, description = "Tags by creation, or by name when autocompleting", body = [TagResponse])
    )
)]
pub async fn list_tags_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<TagQuery>,
) -> Result<Json<Vec<TagResponse>>, HandlerError> {
    let tags = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => state.db.autocomplete_tags(user.id, q).await,
        None => state.db.list_user_tags(user.id).await,
    }
    .map_err(port_error("list tags"))?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

/// GET /tags/colors - The badge palette
#[utoipa::path(
    get,
    path = "/tags/colors",
    responses(
        (status = 200, description = "Every palette color", body = [TagColorResponse])
    )
)]
pub async fn colors_handler(_user: CurrentUser) -> Json<Vec<TagColorResponse>> {
    Json(TAG_COLORS.iter().map(TagColorResponse::from).collect())
}

/// PUT /tags/{id} - Rename or recolor one of the viewer's tags
#[utoipa::path(
    put,
    path = "/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag id")),
    request_body = UpdateTagRequest,
    responses(
        (status = 200, description = "Updated tag", body = TagResponse),
        (status = 400, description = "Invalid name or color"),
        (status = 403, description = "Tag belongs to another user"),
        (status = 404, description = "No such tag"),
        (status = 409, description = "Another tag already has this name")
    )
)]
pub async fn update_tag_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(tag_id): Path<Uuid>,
    Json(req): Json<UpdateTagRequest>,
) -> Result<Json<TagResponse>, HandlerError> {
    let name = normalize_tag_name(&req.name).map_err(bad_request)?;
    let color = validate_color(req.color.trim()).map_err(bad_request)?;
    owned_tag(&state, &user, tag_id).await?;
    let tag = state
        .db
        .update_tag(tag_id, &name, color)
        .await
        .map_err(port_error("update tag"))?;
    Ok(Json(tag.into()))
}

/// DELETE /tags/{id} - Delete one of the viewer's tags
#[utoipa::path(
    delete,
    path = "/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag id")),
    responses(
        (status = 204, description = "Tag deleted and removed from every book"),
        (status = 403, description = "Tag belongs to another user"),
        (status = 404, description = "No such tag")
    )
)]
pub async fn delete_tag_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(tag_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    owned_tag(&state, &user, tag_id).await?;
    state
        .db
        .delete_tag(tag_id)
        .await
        .map_err(port_error("delete tag"))?;
    info!(tag_id = %tag_id, "Tag deleted");
    Ok(StatusCode::NO_CONTENT)
}
