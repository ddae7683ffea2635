//! User Handlers

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};

use crate::{
    api::{handlers::AppState, middleware::AuthUser},
    models::User,
    service::AvatarUpload,
    utils::error::{AppError, AppResult},
};

/// The authenticated user
pub async fn me(Extension(AuthUser(account)): Extension<AuthUser>) -> Json<User> {
    Json(account.into())
}

/// Replace the authenticated user's avatar with the uploaded `file` field
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(AuthUser(account)): Extension<AuthUser>,
    mut multipart: Multipart,
) -> AppResult<Json<User>> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;

        if bytes.len() > state.avatar_max_bytes {
            return Err(AppError::Validation(format!(
                "Avatar must not exceed {} bytes",
                state.avatar_max_bytes
            )));
        }

        upload = Some(AvatarUpload {
            bytes: bytes.to_vec(),
            content_type,
            file_name,
        });
        break;
    }

    let upload =
        upload.ok_or_else(|| AppError::Validation("Missing multipart field 'file'".into()))?;

    let url = state
        .avatar_storage
        .store_avatar(&account.username, upload)
        .await?;
    let updated = state.user_service.update_avatar(&account.email, &url).await?;

    Ok(Json(updated.into()))
}
