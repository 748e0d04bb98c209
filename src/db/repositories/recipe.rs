use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    LoaderTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::{RecipeId, Unit};
use crate::entities::{prelude::*, recipe_ingredients, recipes};
use crate::models::recipe::{Ingredient, PageRequest, Recipe, RecipeDraft};

fn to_recipe(model: recipes::Model, ingredients: Vec<recipe_ingredients::Model>) -> Result<Recipe> {
    let ingredients = ingredients
        .into_iter()
        .map(|row| {
            let unit: Unit = row
                .unit
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("Ingredient {} has an unreadable unit", row.id))?;
            Ok(Ingredient {
                name: row.name,
                quantity: row.quantity,
                unit,
                optional: row.optional,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Recipe {
        id: RecipeId::from_uuid(model.id),
        title: model.title,
        photo: model.photo,
        description: model.description,
        instructions: model.instructions,
        ingredients,
        created_at: model.created_at,
    })
}

async fn insert_ingredients(
    txn: &DatabaseTransaction,
    recipe_id: Uuid,
    ingredients: &[Ingredient],
) -> Result<()> {
    if ingredients.is_empty() {
        return Ok(());
    }

    let rows: Vec<recipe_ingredients::ActiveModel> = ingredients
        .iter()
        .map(|i| recipe_ingredients::ActiveModel {
            id: Set(Uuid::new_v4()),
            recipe_id: Set(recipe_id),
            name: Set(i.name.clone()),
            quantity: Set(i.quantity),
            unit: Set(i.unit.as_str().to_string()),
            optional: Set(i.optional),
        })
        .collect();

    RecipeIngredients::insert_many(rows)
        .exec(txn)
        .await
        .context("Failed to insert ingredients")?;

    Ok(())
}

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the recipe and all its ingredients in one transaction.
    pub async fn create(&self, draft: RecipeDraft) -> Result<Recipe> {
        let txn = self.conn.begin().await?;

        let model = recipes::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(draft.title),
            photo: Set(draft.photo),
            description: Set(draft.description),
            instructions: Set(draft.instructions),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .context("Failed to insert recipe")?;

        insert_ingredients(&txn, model.id, &draft.ingredients).await?;

        txn.commit().await?;

        Ok(Recipe {
            id: RecipeId::from_uuid(model.id),
            title: model.title,
            photo: model.photo,
            description: model.description,
            instructions: model.instructions,
            ingredients: draft.ingredients,
            created_at: model.created_at,
        })
    }

    pub async fn get(&self, id: RecipeId) -> Result<Option<Recipe>> {
        let Some(model) = Recipes::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query recipe")?
        else {
            return Ok(None);
        };

        let ingredients = RecipeIngredients::find()
            .filter(recipe_ingredients::Column::RecipeId.eq(model.id))
            .order_by_asc(recipe_ingredients::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query ingredients")?;

        to_recipe(model, ingredients).map(Some)
    }

    /// Newest first. Returns the page plus the total number of recipes.
    pub async fn list(&self, page: PageRequest) -> Result<(Vec<Recipe>, u64)> {
        let total = Recipes::find()
            .count(&self.conn)
            .await
            .context("Failed to count recipes")?;

        let models = Recipes::find()
            .order_by_desc(recipes::Column::CreatedAt)
            .order_by_asc(recipes::Column::Id)
            .offset(page.offset())
            .limit(page.size)
            .all(&self.conn)
            .await
            .context("Failed to list recipes")?;

        let ingredients = models
            .load_many(RecipeIngredients, &self.conn)
            .await
            .context("Failed to load ingredients")?;

        let recipes = models
            .into_iter()
            .zip(ingredients)
            .map(|(model, rows)| to_recipe(model, rows))
            .collect::<Result<Vec<_>>>()?;

        Ok((recipes, total))
    }

    /// Overwrites the recipe's columns and replaces its ingredient list.
    /// Returns `None` when the recipe does not exist.
    pub async fn update(&self, id: RecipeId, draft: RecipeDraft) -> Result<Option<Recipe>> {
        let txn = self.conn.begin().await?;

        let Some(existing) = Recipes::find_by_id(id.value())
            .one(&txn)
            .await
            .context("Failed to query recipe for update")?
        else {
            return Ok(None);
        };

        let mut active: recipes::ActiveModel = existing.into();
        active.title = Set(draft.title);
        active.photo = Set(draft.photo);
        active.description = Set(draft.description);
        active.instructions = Set(draft.instructions);
        let model = active
            .update(&txn)
            .await
            .context("Failed to update recipe")?;

        RecipeIngredients::delete_many()
            .filter(recipe_ingredients::Column::RecipeId.eq(model.id))
            .exec(&txn)
            .await
            .context("Failed to clear ingredients")?;

        insert_ingredients(&txn, model.id, &draft.ingredients).await?;

        txn.commit().await?;

        Ok(Some(Recipe {
            id,
            title: model.title,
            photo: model.photo,
            description: model.description,
            instructions: model.instructions,
            ingredients: draft.ingredients,
            created_at: model.created_at,
        }))
    }

    /// Returns `false` when nothing was deleted.
    pub async fn delete(&self, id: RecipeId) -> Result<bool> {
        let txn = self.conn.begin().await?;

        RecipeIngredients::delete_many()
            .filter(recipe_ingredients::Column::RecipeId.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to delete ingredients")?;

        let result = Recipes::delete_by_id(id.value())
            .exec(&txn)
            .await
            .context("Failed to delete recipe")?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }
}
