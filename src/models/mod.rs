pub mod recipe;
pub mod session;
