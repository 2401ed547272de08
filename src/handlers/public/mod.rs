// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Donation intake, the public media listing, admin token acquisition and
// service liveness.

pub mod donate;
pub mod login;
pub mod media;
pub mod system;

pub use donate::donate_post;
pub use login::login_post;
pub use media::media_get;
pub use system::{health_get, root_get};
