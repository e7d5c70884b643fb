//! services/api/src/web/books.rs
//!
//! Catalog endpoints: search, category tree, library links, book details and
//! the editor/admin write paths, plus the viewer's status and feedback.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::Query;
use reading_list_core::category::{build_category_tree, decode_category_id, CategoryNode};
use reading_list_core::domain::{parse_optional_choice, BookView, Feedback, ReadingStatus, Role};
use reading_list_core::library::build_library_search_urls;
use reading_list_core::search::{
    SearchMode, SearchQuery, Sort, SortColumn, SortOrder, UserFilters, ValueFilter,
};
use reading_list_core::validation::{validate_book_draft, ValidationError};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::web::dto::{
    BookPayload, BookResponse, CategoryNodeResponse, CategoryParams, FeedbackRequest,
    HealthResponse, LibraryParams, SearchParams, StatusRequest,
};
use crate::web::extract::{CurrentUser, MaybeUser};
use crate::web::state::AppState;
use crate::web::{bad_request, port_error, HandlerError};

//=========================================================================================
// Query Composition
//=========================================================================================

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Turns `/search` parameters into a [`SearchQuery`].
///
/// Exactly one of `author`, `title` or `cat` picks the mode; with none of them
/// the query is an empty category selection and matches nothing.
pub fn compose_search(
    params: SearchParams,
    viewer: Option<Uuid>,
) -> Result<SearchQuery, ValidationError> {
    let criteria = [params.author.is_some(), params.title.is_some(), !params.cat.is_empty()];
    if criteria.iter().filter(|given| **given).count() > 1 {
        return Err(ValidationError::BadSearch(
            "give only one of author, title or cat",
        ));
    }

    let mode = match (params.author, params.title) {
        (Some(author), _) => SearchMode::Author(author),
        (None, Some(title)) => SearchMode::Title(title),
        (None, None) => SearchMode::Categories(
            params
                .cat
                .iter()
                .map(|id| decode_category_id(id))
                .collect::<Result<_, _>>()?,
        ),
    };

    let status = match non_blank(&params.status) {
        Some(raw) => Some(ValueFilter::from_choice(parse_optional_choice::<ReadingStatus>(raw)?)),
        None => None,
    };
    let feedback = match non_blank(&params.feedback) {
        Some(raw) => Some(ValueFilter::from_choice(parse_optional_choice::<Feedback>(raw)?)),
        None => None,
    };
    let filters = UserFilters {
        status,
        feedback,
        tag_ids: params.tag,
    };

    let sort = match non_blank(&params.sort_column) {
        Some(column) => Some(Sort {
            column: SortColumn::from_str(column)?,
            order: match non_blank(&params.sort_order) {
                Some(order) => SortOrder::from_str(order)?,
                None => SortOrder::default(),
            },
        }),
        None => None,
    };

    Ok(SearchQuery::new(mode, viewer, filters, sort))
}

fn mark_checked(nodes: &mut [CategoryNode], selected: &HashSet<String>) {
    for node in nodes {
        node.checked = selected.contains(&node.full_path);
        mark_checked(&mut node.nodes, selected);
    }
}

async fn ensure_book_exists(state: &AppState, book_id: Uuid) -> Result<(), HandlerError> {
    state
        .db
        .get_book(book_id)
        .await
        .map(|_| ())
        .map_err(port_error("load book"))
}

async fn load_view(
    state: &AppState,
    book_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<BookView, HandlerError> {
    state
        .db
        .get_book_view(book_id, viewer)
        .await
        .map_err(port_error("load book"))
}

//=========================================================================================
// Public Handlers
//=========================================================================================

/// GET /health - Liveness, including the storage backend
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and storage are up", body = HealthResponse),
        (status = 503, description = "Storage is unreachable")
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
            }),
        ),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                }),
            )
        }
    }
}

/// GET /categories - The category tree derived from every book
#[utoipa::path(
    get,
    path = "/categories",
    params(CategoryParams),
    responses(
        (status = 200, description = "Root category nodes", body = [CategoryNodeResponse]),
        (status = 400, description = "Malformed category id")
    )
)]
pub async fn categories_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CategoryParams>,
) -> Result<Json<Vec<CategoryNodeResponse>>, HandlerError> {
    let selected = params
        .cat
        .iter()
        .map(|id| decode_category_id(id))
        .collect::<Result<HashSet<_>, _>>()
        .map_err(bad_request)?;

    let paths = state
        .db
        .list_category_paths()
        .await
        .map_err(port_error("list categories"))?;
    let mut tree = build_category_tree(&paths);
    mark_checked(&mut tree, &selected);

    Ok(Json(tree.into_iter().map(CategoryNodeResponse::from).collect()))
}

/// GET /search - Filtered catalog search
#[utoipa::path(
    get,
    path = "/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching books with the viewer's data", body = [BookResponse]),
        (status = 400, description = "Invalid search parameters")
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<BookResponse>>, HandlerError> {
    let query = compose_search(params, viewer.id()).map_err(bad_request)?;
    let results = state
        .db
        .search_books(&query)
        .await
        .map_err(port_error("search books"))?;
    debug!(count = results.len(), "Search completed");
    Ok(Json(results.into_iter().map(BookResponse::from).collect()))
}

/// GET /library_searches - Public library search links for a book
#[utoipa::path(
    get,
    path = "/library_searches",
    params(LibraryParams),
    responses(
        (status = 200, description = "Library name to search URL", body = BTreeMap<String, String>),
        (status = 400, description = "author or title missing")
    )
)]
pub async fn library_searches_handler(
    Query(params): Query<LibraryParams>,
) -> Result<Json<BTreeMap<String, String>>, HandlerError> {
    let author = non_blank(&params.author)
        .ok_or(ValidationError::Required("author"))
        .map_err(bad_request)?;
    let title = non_blank(&params.title)
        .ok_or(ValidationError::Required("title"))
        .map_err(bad_request)?;
    Ok(Json(build_library_search_urls(author, title)))
}

/// GET /books/{id} - Book details
#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book, with the viewer's data when logged in", body = BookResponse),
        (status = 404, description = "No such book")
    )
)]
pub async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResponse>, HandlerError> {
    let view = load_view(&state, book_id, viewer.id()).await?;
    Ok(Json(view.into()))
}

//=========================================================================================
// Editor and Admin Handlers
//=========================================================================================

/// POST /books - Add a book (editor)
#[utoipa::path(
    post,
    path = "/books",
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Editor role required")
    )
)]
pub async fn add_book_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<BookPayload>,
) -> Result<impl IntoResponse, HandlerError> {
    user.require_role(Role::Editor)?;
    let draft = validate_book_draft(payload.into()).map_err(bad_request)?;
    let book = state
        .db
        .create_book(draft)
        .await
        .map_err(port_error("create book"))?;
    info!(book_id = %book.id, user_id = %user.id, "Book added");
    Ok((
        StatusCode::CREATED,
        Json(BookResponse::from(BookView::anonymous(book))),
    ))
}

/// PUT /books/{id} - Replace a book's fields (editor)
#[utoipa::path(
    put,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "No such book")
    )
)]
pub async fn edit_book_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<BookResponse>, HandlerError> {
    user.require_role(Role::Editor)?;
    let draft = validate_book_draft(payload.into()).map_err(bad_request)?;
    state
        .db
        .update_book(book_id, draft)
        .await
        .map_err(port_error("update book"))?;
    info!(book_id = %book_id, user_id = %user.id, "Book updated");
    let view = load_view(&state, book_id, Some(user.id)).await?;
    Ok(Json(view.into()))
}

/// DELETE /books/{id} - Remove a book (admin)
#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "No such book")
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    user.require_role(Role::Admin)?;
    state
        .db
        .delete_book(book_id)
        .await
        .map_err(port_error("delete book"))?;
    info!(book_id = %book_id, user_id = %user.id, "Book deleted");
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Per-User Handlers
//=========================================================================================

/// PUT /books/{id}/status - Set or clear the viewer's reading status
#[utoipa::path(
    put,
    path = "/books/{id}/status",
    params(("id" = Uuid, Path, description = "Book id")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Updated book view", body = BookResponse),
        (status = 400, description = "Unknown status value"),
        (status = 404, description = "No such book")
    )
)]
pub async fn set_status_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(book_id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<BookResponse>, HandlerError> {
    let status = parse_optional_choice::<ReadingStatus>(&req.status).map_err(bad_request)?;
    ensure_book_exists(&state, book_id).await?;
    state
        .db
        .set_reading_status(user.id, book_id, status)
        .await
        .map_err(port_error("set reading status"))?;
    let view = load_view(&state, book_id, Some(user.id)).await?;
    Ok(Json(view.into()))
}

/// PUT /books/{id}/feedback - Set or clear the viewer's feedback
#[utoipa::path(
    put,
    path = "/books/{id}/feedback",
    params(("id" = Uuid, Path, description = "Book id")),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Updated book view", body = BookResponse),
        (status = 400, description = "Unknown feedback value"),
        (status = 404, description = "No such book")
    )
)]
pub async fn set_feedback_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(book_id): Path<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<BookResponse>, HandlerError> {
    let feedback = parse_optional_choice::<Feedback>(&req.feedback).map_err(bad_request)?;
    ensure_book_exists(&state, book_id).await?;
    state
        .db
        .set_feedback(user.id, book_id, feedback)
        .await
        .map_err(port_error("set feedback"))?;
    let view = load_view(&state, book_id, Some(user.id)).await?;
    Ok(Json(view.into()))
}
