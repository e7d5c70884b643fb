//! services/api/src/web/extract.rs
//!
//! Extractors for the user resolved by the session middleware.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use reading_list_core::domain::Role;
use std::convert::Infallible;
use uuid::Uuid;

/// The signed-in user making the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
}

impl CurrentUser {
    /// Fails with 403 Forbidden unless the user holds `role`.
    pub fn require_role(&self, role: Role) -> Result<(), (StatusCode, String)> {
        if self.roles.contains(&role) {
            Ok(())
        } else {
            Err((
                StatusCode::FORBIDDEN,
                format!("The '{}' role is required", role),
            ))
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, "Login required".to_string()))
    }
}

/// The viewer, when there is one. Public routes use this.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<CurrentUser>().cloned()))
    }
}
