//! Data Models Module
//!
//! This module contains all data structures used throughout the contacts service.
//! It includes user and contact entities, request/response types, and validation logic.

pub mod auth;
pub mod contact;
pub mod requests;
pub mod user;

// Re-export commonly used types
pub use auth::*;
pub use contact::*;
pub use requests::*;
pub use user::*;
