pub mod auth;
pub mod extract;

pub use auth::{CurrentUser, RequireAdmin};
pub use extract::{ApiJson, ApiPath, ApiQuery};
