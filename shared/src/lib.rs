//! Shared types for the asset server
//!
//! Wire models (roles, permission matrices, user identities) and the unified
//! error system used by the server and its API clients.

pub mod error;
pub mod models;

// Re-exports
pub use axum::Json;
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
