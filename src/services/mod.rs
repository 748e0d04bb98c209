pub mod password;
pub use password::PasswordHasher;

pub mod token_service;
pub mod token_service_impl;
pub use token_service::{TokenError, TokenService};
pub use token_service_impl::SeaOrmTokenService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{Profile, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod recipe_service;
pub mod recipe_service_impl;
pub use recipe_service::{RecipeError, RecipeService};
pub use recipe_service_impl::SeaOrmRecipeService;

pub mod session_sweeper;
pub use session_sweeper::SessionSweeper;
