//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for login, logout and the current user, plus the
//! password helpers shared with user administration and startup.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use reading_list_core::domain::{NewUser, Role};
use reading_list_core::ports::{DatabaseService, PortError};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::BootstrapAdmin;
use crate::error::ApiError;
use crate::web::dto::{LoginRequest, UserResponse};
use crate::web::extract::CurrentUser;
use crate::web::middleware::{session_id_from_headers, SESSION_COOKIE};
use crate::web::state::AppState;
use crate::web::{port_error, HandlerError};

//=========================================================================================
// Password Helpers
//=========================================================================================

/// Hashes a password with Argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Checks a password against a stored PHC hash string.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hashed)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Creates the configured administrator unless a user with that email exists.
pub async fn ensure_bootstrap_admin(
    db: &dyn DatabaseService,
    admin: &BootstrapAdmin,
) -> Result<(), ApiError> {
    match db.get_user_by_email(&admin.email).await {
        Ok(_) => {
            info!("Bootstrap admin {} already exists.", admin.email);
            return Ok(());
        }
        Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }
    let hashed_password = hash_password(&admin.password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash bootstrap password: {}", e)))?;
    let user = db
        .create_user(NewUser {
            email: admin.email.clone(),
            hashed_password,
            roles: vec![Role::Admin, Role::Editor],
        })
        .await?;
    info!(user_id = %user.id, "Created bootstrap admin {}", user.email);
    Ok(())
}

fn session_cookie(auth_session_id: &str, max_age_seconds: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, auth_session_id, max_age_seconds
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = UserResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let invalid = || (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string());

    // 1. Get user by email
    let user_creds = match state.db.get_user_by_email(req.email.trim()).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(invalid()),
        Err(e) => return Err(port_error("look up user")(e)),
    };

    // 2. Verify password
    let valid = verify_password(&req.password, &user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;
    if !valid {
        return Err(invalid());
    }
    if !user_creds.active {
        warn!(user_id = %user_creds.user_id, "Login attempt on a deactivated account");
        return Err(invalid());
    }

    // 3. Create the auth session
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::try_days(state.config.session_ttl_days).ok_or_else(|| {
        error!("Session TTL of {} days is out of range", state.config.session_ttl_days);
        (StatusCode::INTERNAL_SERVER_ERROR, "Session error".to_string())
    })?;
    state
        .db
        .create_auth_session(&auth_session_id, user_creds.user_id, Utc::now() + ttl)
        .await
        .map_err(port_error("create session"))?;

    let user = state
        .db
        .get_user(user_creds.user_id)
        .await
        .map_err(port_error("load user"))?;
    info!(user_id = %user.id, "User logged in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&auth_session_id, ttl.num_seconds()))],
        Json(UserResponse::from(user)),
    ))
}

/// POST /auth/logout - Logout and invalidate the session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out, session cookie cleared")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    if let Some(auth_session_id) = session_id_from_headers(&headers) {
        state
            .db
            .delete_auth_session(auth_session_id)
            .await
            .map_err(port_error("logout"))?;
    }
    Ok((StatusCode::OK, [(header::SET_COOKIE, session_cookie("", 0))]))
}

/// GET /auth/me - The signed-in user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "The current user", body = UserResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<UserResponse>, HandlerError> {
    let user = state
        .db
        .get_user(user.id)
        .await
        .map_err(port_error("load user"))?;
    Ok(Json(user.into()))
}
