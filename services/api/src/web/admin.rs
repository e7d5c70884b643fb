//! services/api/src/web/admin.rs
//!
//! User administration. Registration is admin-only; there is no public signup.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use reading_list_core::domain::{NewUser, Role};
use reading_list_core::validation::ValidationError;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::web::auth::hash_password;
use crate::web::dto::{RegisterUserRequest, UpdateUserRequest, UserResponse};
use crate::web::extract::CurrentUser;
use crate::web::state::AppState;
use crate::web::{bad_request, port_error, HandlerError};

const MAX_EMAIL_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;

fn parse_roles(raw: &[String]) -> Result<Vec<Role>, ValidationError> {
    raw.iter().map(|r| Role::from_str(r.trim())).collect()
}

fn normalize_email(raw: &str) -> Result<String, HandlerError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(bad_request(ValidationError::Required("email")));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(bad_request(ValidationError::TooLong {
            field: "email",
            max: MAX_EMAIL_LEN,
        }));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email.to_string()),
        _ => Err((StatusCode::BAD_REQUEST, format!("'{}' is not an email address", email))),
    }
}

/// GET /admin/users - Every user
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "Users ordered by email", body = [UserResponse]),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    admin: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, HandlerError> {
    admin.require_role(Role::Admin)?;
    let users = state
        .db
        .list_users()
        .await
        .map_err(port_error("list users"))?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /admin/users - Register a user
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid email, password or role"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_user_handler(
    State(state): State<Arc<AppState>>,
    admin: CurrentUser,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    admin.require_role(Role::Admin)?;
    let email = normalize_email(&req.email)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    let roles = parse_roles(&req.roles).map_err(bad_request)?;

    let hashed_password = hash_password(&req.password).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password".to_string())
    })?;
    let user = state
        .db
        .create_user(NewUser {
            email,
            hashed_password,
            roles,
        })
        .await
        .map_err(port_error("create user"))?;
    info!(user_id = %user.id, admin_id = %admin.id, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// PUT /admin/users/{id} - Change a user's roles and active flag
#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid role, or an admin locking themselves out"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "No such user")
    )
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    admin: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, HandlerError> {
    admin.require_role(Role::Admin)?;
    let roles = parse_roles(&req.roles).map_err(bad_request)?;
    if user_id == admin.id && (!req.active || !roles.contains(&Role::Admin)) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Admins cannot deactivate or demote themselves".to_string(),
        ));
    }
    let user = state
        .db
        .update_user(user_id, roles, req.active)
        .await
        .map_err(port_error("update user"))?;
    info!(user_id = %user.id, admin_id = %admin.id, active = user.active, "User updated");
    Ok(Json(user.into()))
}

/// DELETE /admin/users/{id} - Delete a user and everything they own
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Admins cannot delete themselves"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "No such user")
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    admin: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    admin.require_role(Role::Admin)?;
    if user_id == admin.id {
        return Err((
            StatusCode::BAD_REQUEST,
            "Admins cannot delete themselves".to_string(),
        ));
    }
    state
        .db
        .delete_user(user_id)
        .await
        .map_err(port_error("delete user"))?;
    info!(user_id = %user_id, admin_id = %admin.id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_or_fail_as_a_whole() {
        let roles = parse_roles(&["admin".into(), " editor ".into()]).unwrap();
        assert_eq!(roles, vec![Role::Admin, Role::Editor]);
        assert!(parse_roles(&["owner".into()]).is_err());
    }

    #[test]
    fn emails_are_trimmed_and_checked() {
        assert_eq!(normalize_email("  a@b.org ").unwrap(), "a@b.org");
        assert!(normalize_email("").is_err());
        assert!(normalize_email("nobody").is_err());
        assert!(normalize_email("@b.org").is_err());
    }
}
