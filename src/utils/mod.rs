//! Utilities Module
//!
//! Error type, password and token helpers, and input validation shared by the
//! contacts service.

pub mod error;
pub mod security;
pub mod validation;

// Re-export commonly used utilities
pub use error::{AppError, AppResult, ErrorResponse};
pub use security::*;
pub use validation::*;
