//! Authentication Middleware
//!
//! Bearer-token authentication, the admin gate and per-client rate limiting.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::api::handlers::AppState;
use crate::models::UserAccount;
use crate::service::rate_limit_service::client_key;
use crate::utils::error::AppError;

/// Extension type for storing the authenticated account in request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserAccount);

const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// Resolves the bearer token to an account and stores it as [`AuthUser`]
///
/// A missing or malformed header gives 401 "Not authenticated"; a token
/// that does not resolve to an account gives 401 "Unable to validate credentials".
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Authentication(NOT_AUTHENTICATED.into()))?;

    let account = state.auth_service.current_user(token).await?;

    request.extensions_mut().insert(AuthUser(account));
    Ok(next.run(request).await)
}

/// Lets only admins through; must run after [`auth_middleware`]
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, AppError> {
    let auth_user = extract_auth_user(&request)?;

    if !auth_user.is_admin() {
        log::warn!("User {} denied admin access", auth_user.username);
        return Err(AppError::Forbidden("Access denied".into()));
    }

    Ok(next.run(request).await)
}

/// Applies the current-user rate limit keyed by client address
pub async fn me_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);

    state.me_rate_limiter.check(&key)?;

    Ok(next.run(request).await)
}

/// Helper function to extract the authenticated account from request extensions
///
/// The auth_middleware must be applied to the route for this to work.
pub fn extract_auth_user(request: &Request) -> Result<&UserAccount, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .map(|auth_user| &auth_user.0)
        .ok_or_else(|| AppError::Authentication(NOT_AUTHENTICATED.into()))
}
