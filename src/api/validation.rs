use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::ApiError;
use super::types::{CreateRecipeRequest, IngredientRequest, LoginRequest, RegisterRequest, UpdateRecipeRequest};
use crate::domain::Unit;
use crate::models::recipe::{Ingredient, RecipeDraft, RecipePatch};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

const MAX_NAME_LEN: usize = 100;
const MAX_TITLE_LEN: usize = 200;

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Err(ApiError::validation(format!("Invalid email address: {trimmed}")));
    }
    Ok(trimmed)
}

/// Checks the request shape. Password strength is left to the user service.
pub fn validate_register(req: &RegisterRequest) -> Result<(), ApiError> {
    let name = req.username.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::validation(format!(
            "Username must be {MAX_NAME_LEN} characters or less"
        )));
    }

    validate_email(&req.email)?;

    if req.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    if req.password != req.repeated_password {
        return Err(ApiError::validation("Passwords do not match"));
    }

    Ok(())
}

pub fn validate_login(req: &LoginRequest) -> Result<(), ApiError> {
    if req.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if req.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    Ok(())
}

pub fn validate_unit(unit: &str) -> Result<Unit, ApiError> {
    unit.trim().to_lowercase().parse().map_err(|_| {
        let allowed: Vec<&str> = Unit::ALL.iter().map(Unit::as_str).collect();
        ApiError::validation(format!(
            "Invalid unit '{unit}'. Allowed units: {}",
            allowed.join(", ")
        ))
    })
}

pub fn validate_ingredients(items: Vec<IngredientRequest>) -> Result<Vec<Ingredient>, ApiError> {
    let mut seen = HashSet::new();

    items
        .into_iter()
        .map(|item| {
            let name = item.name.trim().to_string();
            if name.is_empty() {
                return Err(ApiError::validation("Ingredient name cannot be empty"));
            }
            if !item.quantity.is_finite() || item.quantity <= 0.0 {
                return Err(ApiError::validation(format!(
                    "Ingredient '{name}' must have a positive quantity"
                )));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ApiError::validation(format!(
                    "Ingredient '{name}' is listed more than once"
                )));
            }

            Ok(Ingredient {
                unit: validate_unit(&item.unit)?,
                name,
                quantity: item.quantity,
                optional: item.optional,
            })
        })
        .collect()
}

fn validate_title(title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::validation(format!(
            "Title must be {MAX_TITLE_LEN} characters or less"
        )));
    }
    Ok(title.to_string())
}

pub fn validate_create_recipe(req: CreateRecipeRequest) -> Result<RecipeDraft, ApiError> {
    let title = validate_title(&req.title)?;

    if req.instructions.trim().is_empty() {
        return Err(ApiError::validation("Instructions are required"));
    }
    if req.ingredients.is_empty() {
        return Err(ApiError::validation("At least one ingredient is required"));
    }

    Ok(RecipeDraft {
        title,
        photo: req.photo.filter(|p| !p.is_empty()),
        description: req.description.trim().to_string(),
        instructions: req.instructions.trim().to_string(),
        ingredients: validate_ingredients(req.ingredients)?,
    })
}

pub fn validate_update_recipe(req: UpdateRecipeRequest) -> Result<RecipePatch, ApiError> {
    let title = match req.title {
        Some(t) if !t.trim().is_empty() => Some(validate_title(&t)?),
        _ => None,
    };

    let ingredients = match req.ingredients {
        Some(items) if !items.is_empty() => Some(validate_ingredients(items)?),
        _ => None,
    };

    Ok(RecipePatch {
        title,
        photo: req.photo,
        description: req.description.map(|d| d.trim().to_string()),
        instructions: req.instructions.map(|i| i.trim().to_string()),
        ingredients,
    })
}
