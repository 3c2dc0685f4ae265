//! Admin authentication middleware
//!
//! Applied to admin and ingest routes only. Expects
//! `Authorization: Bearer <Google ID token>`; on success the resolved
//! [`AdminSession`] is available to handlers as an `Extension`.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::{AdminSession, IdentityError};
use crate::AppState;

/// Token from an `Authorization: Bearer …` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }
    Some(token.trim().to_string())
}

/// Authentication middleware
///
/// 401 when the token is missing or fails verification, 403 when the
/// verified e-mail is not on the allowlist.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or(IdentityError::MissingToken)?;

    let session = match state.auth.authenticate(&token).await {
        Ok(session) => session,
        Err(e) => {
            warn!(path = %request.uri().path(), error = %e, "Admin authentication failed");
            return Err(e.into());
        }
    };

    debug!(email = %session.email, path = %request.uri().path(), "Admin request");
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// GET /api/session
pub async fn current_session(Extension(session): Extension<AdminSession>) -> ApiResult<Json<AdminSession>> {
    Ok(Json(session))
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/api/session", get(current_session))
}
