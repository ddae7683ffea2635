//! API Layer
//!
//! HTTP endpoints, middleware and routing for the contacts service.

pub mod auth_handlers;
pub mod contact_handlers;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod user_handlers;

// Re-export commonly used types
pub use handlers::AppState;
pub use middleware::{
    admin_middleware, auth_middleware, extract_auth_user, me_rate_limit_middleware, AuthUser,
};
pub use routes::{create_routes, RouterBuilder};
