pub mod prelude;

pub mod recipe_ingredients;
pub mod recipes;
pub mod user_tokens;
pub mod users;
