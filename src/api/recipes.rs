use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::require_admin;
use super::types::{CreateRecipeRequest, MessageResponse, PageQuery, UpdateRecipeRequest};
use super::{ApiError, AppState, validation};
use crate::domain::{Principal, RecipeId};
use crate::models::recipe::{PageRequest, Recipe, RecipePage};

/// GET /recipes?size=&page=
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<RecipePage>, ApiError> {
    let Query(query) = query?;
    let page = PageRequest::new(query.size, query.page);

    let recipes = state.recipes().list(page).await?;
    Ok(Json(recipes))
}

/// GET /recipes/{id}
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    id: Result<Path<RecipeId>, PathRejection>,
) -> Result<Json<Recipe>, ApiError> {
    let Path(id) = id?;
    let recipe = state.recipes().get(id).await?;
    Ok(Json(recipe))
}

/// POST /recipes (admin)
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    payload: Result<Json<CreateRecipeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    require_admin(&principal)?;
    let Json(payload) = payload?;

    let draft = validation::validate_create_recipe(payload)?;
    let recipe = state.recipes().create(draft).await?;

    Ok((StatusCode::CREATED, Json(recipe)))
}

/// PUT /recipes/{id} (admin)
/// Fields left out or empty keep their stored value.
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    id: Result<Path<RecipeId>, PathRejection>,
    payload: Result<Json<UpdateRecipeRequest>, JsonRejection>,
) -> Result<Json<Recipe>, ApiError> {
    require_admin(&principal)?;
    let Path(id) = id?;
    let Json(payload) = payload?;

    let patch = validation::validate_update_recipe(payload)?;
    let recipe = state.recipes().update(id, patch).await?;

    Ok(Json(recipe))
}

/// DELETE /recipes/{id} (admin)
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    id: Result<Path<RecipeId>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin(&principal)?;
    let Path(id) = id?;

    state.recipes().delete(id).await?;

    Ok(Json(MessageResponse {
        message: format!("Recipe {id} deleted"),
    }))
}
