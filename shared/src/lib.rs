//! Shared types for the Atelier order-management backend
//!
//! Common types used across crates: the order data model, the unified
//! error system, and the API response envelope.

pub mod error;
pub mod models;
pub mod response;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult};
pub use response::ApiResponse;
