//! API Route Definitions
//!
//! All endpoints live under `/api`. The RouterBuilder enables route groups
//! selectively, so a deployment can expose e.g. only the health check, and
//! optionally serves locally stored avatars.

use std::path::PathBuf;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use tower_http::services::ServeDir;

use super::{auth_handlers, contact_handlers, handlers::*, middleware::*, user_handlers};
use crate::service::upload::LOCAL_AVATAR_ROUTE;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 16 * 1024;

/// Builder for creating API routes with configurable endpoint groups
#[derive(Default)]
pub struct RouterBuilder {
    /// GET /api/health
    health_check: bool,
    /// Registration, login, email confirmation and password reset under /api/auth
    auth: bool,
    /// GET /api/users/me and PATCH /api/users/avatar
    users: bool,
    /// Contact CRUD and birthdays under /api/contacts
    contacts: bool,
    /// Directory served at /static/avatars
    local_avatar_dir: Option<PathBuf>,
}

impl RouterBuilder {
    /// Creates a new router builder with all routes disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router builder with every API route enabled
    pub fn with_all_routes() -> Self {
        Self {
            health_check: true,
            auth: true,
            users: true,
            contacts: true,
            local_avatar_dir: None,
        }
    }

    /// Creates a router with only the health check, for monitoring
    pub fn with_minimal_routes() -> Self {
        Self {
            health_check: true,
            ..Self::default()
        }
    }

    pub fn health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    pub fn auth(mut self, enabled: bool) -> Self {
        self.auth = enabled;
        self
    }

    pub fn users(mut self, enabled: bool) -> Self {
        self.users = enabled;
        self
    }

    pub fn contacts(mut self, enabled: bool) -> Self {
        self.contacts = enabled;
        self
    }

    /// Serves avatars written by the local storage backend
    pub fn local_avatars(mut self, dir: PathBuf) -> Self {
        self.local_avatar_dir = Some(dir);
        self
    }

    fn auth_routes() -> Router<AppState> {
        Router::new()
            .route("/auth/register", post(auth_handlers::register))
            .route("/auth/login", post(auth_handlers::login))
            .route(
                "/auth/confirmed_email/{token}",
                get(auth_handlers::confirmed_email),
            )
            .route("/auth/request_email", post(auth_handlers::request_email))
            .route("/auth/reset_password", post(auth_handlers::reset_password))
            .route(
                "/auth/confirm_reset_password/{token}",
                get(auth_handlers::confirm_reset_password),
            )
    }

    fn user_routes(state: &AppState) -> Router<AppState> {
        // route_layer order: the layer added last runs first
        let me = Router::new()
            .route("/users/me", get(user_handlers::me))
            .route_layer(from_fn_with_state(state.clone(), auth_middleware))
            .route_layer(from_fn_with_state(
                state.clone(),
                me_rate_limit_middleware,
            ));

        let avatar = Router::new()
            .route("/users/avatar", patch(user_handlers::update_avatar))
            .route_layer(from_fn(admin_middleware))
            .route_layer(from_fn_with_state(state.clone(), auth_middleware))
            .layer(DefaultBodyLimit::max(
                state.avatar_max_bytes + MULTIPART_OVERHEAD,
            ));

        me.merge(avatar)
    }

    fn contact_routes(state: &AppState) -> Router<AppState> {
        Router::new()
            .route(
                "/contacts",
                get(contact_handlers::list_contacts).post(contact_handlers::create_contact),
            )
            .route(
                "/contacts/birthdays",
                get(contact_handlers::upcoming_birthdays),
            )
            .route(
                "/contacts/{id}",
                get(contact_handlers::get_contact)
                    .put(contact_handlers::update_contact)
                    .delete(contact_handlers::delete_contact),
            )
            .route_layer(from_fn_with_state(state.clone(), auth_middleware))
    }

    /// Builds the Axum router with the configured routes
    ///
    /// The state is needed up front for the authentication layers; callers
    /// still finish with `.with_state(state)`.
    pub fn build(self, state: &AppState) -> Router<AppState> {
        let mut api = Router::new();

        if self.health_check {
            api = api.route("/health", get(health_check));
        }

        if self.auth {
            api = api.merge(Self::auth_routes());
        }

        if self.users {
            api = api.merge(Self::user_routes(state));
        }

        if self.contacts {
            api = api.merge(Self::contact_routes(state));
        }

        let mut router = Router::new().nest("/api", api);

        if let Some(dir) = self.local_avatar_dir {
            router = router.nest_service(LOCAL_AVATAR_ROUTE, ServeDir::new(dir));
        }

        router
    }
}

/// Creates all API routes
pub fn create_routes(state: &AppState) -> Router<AppState> {
    RouterBuilder::with_all_routes().build(state)
}
