//! Shared harness for the HTTP integration tests: the full router over
//! in-memory repositories, a mailer that records outgoing email and local
//! avatar storage in a temporary directory.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::util::ServiceExt;

use contacts_service::{
    api::{AppState, RouterBuilder},
    config::{AppConfig, AvatarBackend, AvatarConfig, JwtConfig, RateLimitConfig, ServerConfig},
    database::DatabaseConfig,
    models::Role,
    repository::{InMemoryContactRepository, InMemoryUserRepository},
    service::{LocalAvatarStorage, Mailer, OutgoingEmail},
    AppResult, UserCreate,
};

pub const BASE_URL: &str = "http://localhost:8000";

/// Delivers into a channel the test can await
struct RecordingMailer(mpsc::UnboundedSender<OutgoingEmail>);

#[async_trait]
impl Mailer for RecordingMailer {
    async fn deliver(&self, email: OutgoingEmail) -> AppResult<()> {
        let _ = self.0.send(email);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub outbox: mpsc::UnboundedReceiver<OutgoingEmail>,
    pub avatar_dir: PathBuf,
}

pub fn test_config(avatar_dir: PathBuf, me_per_minute: u32) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            base_url: BASE_URL.to_string(),
        },
        database: DatabaseConfig::default(),
        jwt: JwtConfig {
            secret: "integration_test_secret".to_string(),
            algorithm: jsonwebtoken::Algorithm::HS256,
            access_token_expires_seconds: 3600,
            email_token_expires_days: 7,
        },
        bcrypt_cost: 4,
        email: None,
        avatar: AvatarConfig {
            backend: AvatarBackend::Local { dir: avatar_dir },
            max_bytes: 64 * 1024,
        },
        rate_limit: RateLimitConfig { me_per_minute },
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_rate_limit(100)
    }

    pub fn with_rate_limit(me_per_minute: u32) -> Self {
        let avatar_dir =
            std::env::temp_dir().join(format!("contacts-avatars-{}", uuid::Uuid::new_v4()));
        let config = test_config(avatar_dir.clone(), me_per_minute);
        let (tx, outbox) = mpsc::unbounded_channel();

        let state = AppState::from_config(
            &config,
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryContactRepository::new()),
            Arc::new(RecordingMailer(tx)),
            Arc::new(LocalAvatarStorage::new(avatar_dir.clone(), BASE_URL)),
        )
        .unwrap();

        let router = RouterBuilder::with_all_routes()
            .local_avatars(avatar_dir.clone())
            .build(&state)
            .with_state(state.clone());

        Self {
            router,
            state,
            outbox,
            avatar_dir,
        }
    }

    /// Sends a request and returns the status, headers and parsed JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, header::HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, body)
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.json(Method::GET, uri, token, None).await
    }

    /// OAuth2 password form login
    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "grant_type=password&username={}&password={}",
                username, password
            )))
            .unwrap();

        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    /// Next email handed to the mailer
    pub async fn next_email(&mut self) -> OutgoingEmail {
        tokio::time::timeout(Duration::from_secs(5), self.outbox.recv())
            .await
            .expect("no email was sent")
            .expect("mailer channel closed")
    }

    /// Registers through the API, follows the confirmation link and logs in
    pub async fn signup_and_login(&mut self, username: &str, email: &str, password: &str) -> String {
        let (status, _) = self
            .json(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "email": email,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let mail = self.next_email().await;
        let token = token_after(&mail.text_body, "/api/auth/confirmed_email/");
        let (status, _) = self
            .get(&format!("/api/auth/confirmed_email/{}", token), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Creates a confirmed admin directly and logs in
    pub async fn admin_token(&self, username: &str, email: &str, password: &str) -> String {
        self.state
            .user_service
            .create_account(
                UserCreate {
                    username: username.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                },
                true,
                Role::Admin,
            )
            .await
            .unwrap();

        let (status, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.avatar_dir);
    }
}

/// The token that follows `marker` in an email body
pub fn token_after(text: &str, marker: &str) -> String {
    let start = text.find(marker).expect("link not found in email") + marker.len();
    text[start..]
        .split_whitespace()
        .next()
        .unwrap()
        .to_string()
}

pub fn contact_body(first_name: &str, email: &str, phone: &str, birthday: &str) -> Value {
    serde_json::json!({
        "first_name": first_name,
        "last_name": "Bond",
        "email": email,
        "phone_number": phone,
        "birthday_date": birthday,
        "info": "MI6",
    })
}
