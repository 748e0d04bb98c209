//! `SeaORM` implementation of the `RecipeService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{Store, is_unique_violation};
use crate::domain::RecipeId;
use crate::models::recipe::{
    PageRequest, Pagination, Recipe, RecipeDraft, RecipePage, RecipePatch,
};
use crate::services::recipe_service::{RecipeError, RecipeService};

pub struct SeaOrmRecipeService {
    store: Store,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn map_write_error(err: anyhow::Error) -> RecipeError {
    if is_unique_violation(&err) {
        RecipeError::InvalidInput("ingredient names must be unique within a recipe".to_string())
    } else {
        RecipeError::from(err)
    }
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list(&self, page: PageRequest) -> Result<RecipePage, RecipeError> {
        let (recipes, total) = self.store.list_recipes(page).await?;

        Ok(RecipePage {
            recipes,
            pagination: Pagination {
                size: page.size,
                page: page.page,
                total,
            },
        })
    }

    async fn get(&self, id: RecipeId) -> Result<Recipe, RecipeError> {
        self.store.get_recipe(id).await?.ok_or(RecipeError::NotFound)
    }

    async fn create(&self, draft: RecipeDraft) -> Result<Recipe, RecipeError> {
        let recipe = self.store.create_recipe(draft).await.map_err(map_write_error)?;
        info!(recipe_id = %recipe.id, title = %recipe.title, "Recipe created");
        Ok(recipe)
    }

    async fn update(&self, id: RecipeId, patch: RecipePatch) -> Result<Recipe, RecipeError> {
        let current = self.get(id).await?;
        let draft = patch.apply(&current);

        let recipe = self
            .store
            .update_recipe(id, draft)
            .await
            .map_err(map_write_error)?
            .ok_or(RecipeError::NotFound)?;

        info!(recipe_id = %id, "Recipe updated");
        Ok(recipe)
    }

    async fn delete(&self, id: RecipeId) -> Result<(), RecipeError> {
        if !self.store.delete_recipe(id).await? {
            return Err(RecipeError::NotFound);
        }

        info!(recipe_id = %id, "Recipe deleted");
        Ok(())
    }
}
