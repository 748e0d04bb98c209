//! Domain service for recipes and their ingredients.

use thiserror::Error;

use crate::domain::RecipeId;
use crate::models::recipe::{PageRequest, Recipe, RecipeDraft, RecipePage, RecipePatch};

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("recipe not found")]
    NotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Persistence(String),
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    async fn list(&self, page: PageRequest) -> Result<RecipePage, RecipeError>;

    async fn get(&self, id: RecipeId) -> Result<Recipe, RecipeError>;

    /// Stores a recipe together with its ingredients, atomically.
    async fn create(&self, draft: RecipeDraft) -> Result<Recipe, RecipeError>;

    /// Replaces only the fields the patch carries a non-empty value for.
    async fn update(&self, id: RecipeId, patch: RecipePatch) -> Result<Recipe, RecipeError>;

    async fn delete(&self, id: RecipeId) -> Result<(), RecipeError>;
}
