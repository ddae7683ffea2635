//! Authentication Handlers
//!
//! Registration, login, email confirmation and password reset endpoints.

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        Path, State,
    },
    http::StatusCode,
    Form, Json,
};

use crate::{
    api::handlers::AppState,
    models::{LoginForm, MessageResponse, RequestEmail, ResetPassword, Token, User, UserCreate},
    utils::error::AppResult,
};

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<UserCreate>, JsonRejection>,
) -> AppResult<(StatusCode, Json<User>)> {
    let Json(body) = body?;
    let user = state.auth_service.register(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange form-encoded credentials for an access token
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> AppResult<Json<Token>> {
    let Form(form) = form?;
    let token = state.auth_service.login(form).await?;
    Ok(Json(token))
}

/// Confirmation link target
pub async fn confirmed_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    Ok(Json(state.auth_service.confirm_email(&token).await?))
}

pub async fn request_email(
    State(state): State<AppState>,
    body: Result<Json<RequestEmail>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(body) = body?;
    Ok(Json(state.auth_service.request_email(body).await?))
}

pub async fn reset_password(
    State(state): State<AppState>,
    body: Result<Json<ResetPassword>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(body) = body?;
    Ok(Json(state.auth_service.request_password_reset(body).await?))
}

/// Password reset link target
pub async fn confirm_reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    Ok(Json(state.auth_service.confirm_password_reset(&token).await?))
}
