// handlers/protected/mod.rs - Protected handlers (admin token required)
//
// Routes in this tier sit behind `middleware::require_admin`, so every handler
// can rely on an `AdminPrincipal` in the request extensions.

pub mod donations;
pub mod upload;

pub use donations::donations_get;
pub use upload::upload_post;
