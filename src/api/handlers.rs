//! HTTP Request Handlers
//!
//! Shared application state and the health check. Feature handlers live in
//! the `*_handlers` modules next to this one.

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    config::AppConfig,
    models::requests::HealthCheckResponse,
    repository::{ContactRepository, UserRepository},
    service::{
        AuthService, AvatarStorage, ContactService, EmailService, JwtService, Mailer,
        RateLimitService, UserService,
    },
    utils::error::{AppError, AppResult},
    VERSION,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub contact_service: Arc<ContactService>,
    pub avatar_storage: Arc<dyn AvatarStorage>,
    pub me_rate_limiter: Arc<RateLimitService>,
    /// Largest accepted avatar file
    pub avatar_max_bytes: usize,
}

impl AppState {
    /// Wire every service from configuration and the chosen backends
    pub fn from_config(
        config: &AppConfig,
        users: Arc<dyn UserRepository>,
        contacts: Arc<dyn ContactRepository>,
        mailer: Arc<dyn Mailer>,
        avatar_storage: Arc<dyn AvatarStorage>,
    ) -> AppResult<Self> {
        let user_service = Arc::new(UserService::new(users).with_bcrypt_cost(config.bcrypt_cost));
        let jwt_service = Arc::new(
            JwtService::from_config(&config.jwt)
                .map_err(|e| AppError::Configuration(e.to_string()))?,
        );
        let app_name = config
            .email
            .as_ref()
            .map(|email| email.from_name.clone())
            .unwrap_or_else(|| "Contacts Service".to_string());
        let email_service = Arc::new(EmailService::new(
            mailer,
            &config.server.base_url,
            &app_name,
        )?);

        Ok(Self {
            auth_service: Arc::new(AuthService::new(
                user_service.clone(),
                jwt_service,
                email_service,
            )),
            user_service,
            contact_service: Arc::new(ContactService::new(contacts)),
            avatar_storage,
            me_rate_limiter: Arc::new(RateLimitService::from_config(&config.rate_limit)),
            avatar_max_bytes: config.avatar.max_bytes,
        })
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthCheckResponse>> {
    // Check database connectivity
    state.user_service.health_check().await?;

    Ok(Json(HealthCheckResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
    }))
}


#[cfg(test)]
mod tests {
    use super::test_support::create_test_state;
    use super::*;

    #[tokio::test]
    async fn test_health_check_reports_version() {
        let state = create_test_state(10);
        let Json(response) = health_check(State(state)).await.unwrap();

        assert_eq!(response.status, "healthy");
        assert_eq!(response.version, VERSION);
    }
}
