use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use std::sync::Arc;

use super::types::UserDto;
use super::{ApiError, AppState};
use crate::domain::{Principal, UserId};
use crate::services::Profile;

/// GET /users/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<UserDto>, ApiError> {
    let user = state.users().get(principal.user_id).await?;
    Ok(Json(UserDto::from(user)))
}

/// GET /users/{id}
/// Public profile: id, name and status only.
pub async fn profile(
    State(state): State<Arc<AppState>>,
    id: Result<Path<UserId>, PathRejection>,
) -> Result<Json<Profile>, ApiError> {
    let Path(id) = id?;
    let profile = state.users().get_profile(id).await?;
    Ok(Json(profile))
}
