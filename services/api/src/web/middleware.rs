//! services/api/src/web/middleware.rs
//!
//! Session middleware.
//!
//! `resolve_session` runs on every route and turns a valid `session` cookie
//! into a [`CurrentUser`] request extension. `require_auth` guards the
//! protected routes and rejects requests where no user was resolved.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use reading_list_core::ports::PortError;
use std::sync::Arc;
use tracing::{debug, error};

use crate::web::extract::CurrentUser;
use crate::web::state::AppState;

/// Name of the auth session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Finds the auth session id in the request's `Cookie` header.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|id| !id.is_empty())
}

/// Middleware that resolves the session cookie, if any, into a `CurrentUser`.
///
/// Never rejects: an unknown or expired session simply leaves the request
/// anonymous.
pub async fn resolve_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let auth_session_id = session_id_from_headers(req.headers()).map(str::to_owned);
    if let Some(auth_session_id) = auth_session_id {
        match lookup_user(&state, &auth_session_id).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(PortError::Unauthorized) | Err(PortError::NotFound(_)) => {
                debug!("Ignoring stale auth session");
            }
            Err(e) => error!("Failed to resolve auth session: {:?}", e),
        }
    }
    next.run(req).await
}

async fn lookup_user(state: &AppState, auth_session_id: &str) -> Result<CurrentUser, PortError> {
    let user_id = state.db.validate_auth_session(auth_session_id).await?;
    let user = state.db.get_user(user_id).await?;
    Ok(CurrentUser {
        id: user.id,
        email: user.email,
        roles: user.roles,
    })
}

/// Middleware that rejects requests without a resolved user with 401 Unauthorized.
pub async fn require_auth(req: Request, next: Next) -> Result<Response, StatusCode> {
    if req.extensions().get::<CurrentUser>().is_none() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn finds_session_among_other_cookies() {
        let headers = with_cookie("theme=dark; session=abc123; lang=en");
        assert_eq!(session_id_from_headers(&headers), Some("abc123"));
    }

    #[test]
    fn ignores_lookalike_and_empty_cookies() {
        assert_eq!(session_id_from_headers(&with_cookie("sessionx=abc")), None);
        assert_eq!(session_id_from_headers(&with_cookie("session=")), None);
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }
}
