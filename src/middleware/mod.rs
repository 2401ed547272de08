pub mod auth;
pub mod response;

pub use auth::require_admin;
pub use response::{ApiResponse, ApiResult};
