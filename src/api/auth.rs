use axum::{
    Json,
    extract::{
        FromRequestParts, Path, Request, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{HeaderValue, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::types::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RevokedResponse, SessionDto,
    UserDto,
};
use super::{ApiError, AppState, validation};
use crate::domain::{Principal, SessionId};

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <token>` to a [`Principal`] and attaches it
/// to the request. Without the header the request is rejected, or forwarded
/// anonymously when `server.require_auth` is off.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        if state.config.server.require_auth {
            return Err(ApiError::unauthorized("missing authorization header"));
        }
        return Ok(next.run(request).await);
    };

    let token = extract_bearer_token(header)?;

    let session = state.tokens().resolve(&token).await?;

    let user = state.users().get(session.user_id).await.map_err(|e| {
        ApiError::internal(format!("Failed to load owner of session {}: {e}", session.id))
    })?;

    tracing::Span::current().record("user_id", tracing::field::display(user.id));

    request.extensions_mut().insert(Principal {
        user_id: user.id,
        token,
        username: user.name,
        status: user.status,
    });

    Ok(next.run(request).await)
}

/// Strips an optional `Bearer ` prefix. Anything left empty is rejected.
fn extract_bearer_token(header: &HeaderValue) -> Result<String, ApiError> {
    let raw = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("malformed authorization header"))?;

    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized("empty bearer token"));
    }

    Ok(token.to_string())
}

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}

pub fn require_admin(principal: &Principal) -> Result<(), ApiError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("admin privileges required"))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<UserDto>, ApiError> {
    let Json(payload) = payload?;
    validation::validate_register(&payload)?;

    let user = state
        .users()
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok(Json(UserDto::from(user)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    validation::validate_login(&payload)?;

    let session = state
        .users()
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(LoginResponse::from(session)))
}

/// POST /auth/logout
/// Revokes the token the request was made with.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<MessageResponse>, ApiError> {
    state.tokens().revoke(&principal.token).await?;

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// GET /auth/sessions
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<SessionDto>>, ApiError> {
    let sessions = state
        .tokens()
        .list_active_sessions(principal.user_id)
        .await?;

    Ok(Json(
        sessions
            .iter()
            .map(|s| SessionDto::new(s, &principal.token))
            .collect(),
    ))
}

/// DELETE /auth/sessions
pub async fn revoke_all_sessions(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<RevokedResponse>, ApiError> {
    let revoked = state
        .tokens()
        .revoke_all_for_user(principal.user_id)
        .await?;

    Ok(Json(RevokedResponse { revoked }))
}

/// DELETE /auth/sessions/{id}
pub async fn revoke_session(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    id: Result<Path<SessionId>, PathRejection>,
) -> Result<Json<RevokedResponse>, ApiError> {
    let Path(session_id) = id?;

    state
        .tokens()
        .revoke_session(principal.user_id, session_id)
        .await
        .map_err(|e| match e {
            crate::services::TokenError::NoToken => ApiError::not_found("Session", session_id),
            other => other.into(),
        })?;

    Ok(Json(RevokedResponse { revoked: 1 }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_optional() {
        let with_prefix = HeaderValue::from_static("Bearer abc123");
        let bare = HeaderValue::from_static("abc123");

        assert_eq!(extract_bearer_token(&with_prefix).unwrap(), "abc123");
        assert_eq!(extract_bearer_token(&bare).unwrap(), "abc123");
    }

    #[test]
    fn empty_bearer_token_is_rejected() {
        assert!(matches!(
            extract_bearer_token(&HeaderValue::from_static("Bearer ")),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            extract_bearer_token(&HeaderValue::from_static("")),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
