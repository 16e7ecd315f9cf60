//! Data models
//!
//! Shared between the asset server and its API clients.
//! All IDs are `i64`.

pub mod permission;
pub mod role;
pub mod serde_helpers;
pub mod user;

// Re-exports
pub use permission::*;
pub use role::*;
pub use user::*;
