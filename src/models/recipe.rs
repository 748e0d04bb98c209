use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{RecipeId, Unit};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub photo: Option<String>,
    pub description: String,
    pub instructions: String,
    pub ingredients: Vec<Ingredient>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    #[serde(default)]
    pub optional: bool,
}

/// Fields of a recipe to be written; used for both create and update.
#[derive(Debug, Clone, Default)]
pub struct RecipeDraft {
    pub title: String,
    pub photo: Option<String>,
    pub description: String,
    pub instructions: String,
    pub ingredients: Vec<Ingredient>,
}

/// Partial update. `None` and empty strings leave the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub photo: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    /// Replaces the whole ingredient list when present and non-empty.
    pub ingredients: Option<Vec<Ingredient>>,
}

impl RecipePatch {
    /// Applies the non-empty fields of this patch on top of `current`.
    #[must_use]
    pub fn apply(self, current: &Recipe) -> RecipeDraft {
        fn pick(new: Option<String>, old: &str) -> String {
            new.filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| old.to_string())
        }

        RecipeDraft {
            title: pick(self.title, &current.title),
            photo: self
                .photo
                .filter(|p| !p.is_empty())
                .or_else(|| current.photo.clone()),
            description: pick(self.description, &current.description),
            instructions: pick(self.instructions, &current.instructions),
            ingredients: self
                .ingredients
                .filter(|list| !list.is_empty())
                .unwrap_or_else(|| current.ingredients.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PageRequest {
    pub size: u64,
    pub page: u64,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u64 = 10;
    pub const MAX_SIZE: u64 = 100;

    /// Zero values fall back to the defaults; `size` is capped.
    #[must_use]
    pub fn new(size: Option<u64>, page: Option<u64>) -> Self {
        let size = size
            .filter(|s| *s > 0)
            .unwrap_or(Self::DEFAULT_SIZE)
            .min(Self::MAX_SIZE);
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        Self { size, page }
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipePage {
    pub recipes: Vec<Recipe>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub size: u64,
    pub page: u64,
    pub total: u64,
}
