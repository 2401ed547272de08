// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (admin token required)
pub mod public;
pub mod protected;

pub use public::*;
pub use protected::*;
