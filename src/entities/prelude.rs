pub use super::recipe_ingredients::Entity as RecipeIngredients;
pub use super::recipes::Entity as Recipes;
pub use super::user_tokens::Entity as UserTokens;
pub use super::users::Entity as Users;
