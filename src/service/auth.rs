//! Authentication Flows
//!
//! Registration, login, email confirmation and password reset. Emails are
//! sent in the background; delivery failures are logged and never reach the
//! caller.

use std::sync::Arc;
use validator::Validate;

use crate::models::{
    LoginForm, MessageResponse, RequestEmail, ResetPassword, Token, User, UserAccount, UserCreate,
};
use crate::service::{EmailService, JwtService, UserService};
use crate::utils::error::{AppError, AppResult};

pub const MSG_ALREADY_CONFIRMED: &str = "Your email is already confirmed";
pub const MSG_EMAIL_CONFIRMED: &str = "Email confirmed";
pub const MSG_CHECK_VERIFICATION: &str = "Check your mail for verification";
pub const MSG_CHECK_EMAIL: &str = "Check your email";
pub const MSG_PASSWORD_CHANGED: &str = "Password successfully changed";

/// Message for every rejected bearer token
pub const MSG_INVALID_CREDENTIALS: &str = "Unable to validate credentials";

#[derive(Clone)]
pub struct AuthService {
    user_service: Arc<UserService>,
    jwt_service: Arc<JwtService>,
    email_service: Arc<EmailService>,
}

impl AuthService {
    pub fn new(
        user_service: Arc<UserService>,
        jwt_service: Arc<JwtService>,
        email_service: Arc<EmailService>,
    ) -> Self {
        Self {
            user_service,
            jwt_service,
            email_service,
        }
    }

    /// Queue the confirmation email for an account
    fn spawn_confirmation_email(&self, email: String, username: String) {
        let token = match self.jwt_service.create_email_token(&email) {
            Ok(token) => token,
            Err(e) => {
                log::error!("Failed to create email token for {}: {}", email, e);
                return;
            }
        };

        let email_service = self.email_service.clone();
        tokio::spawn(async move {
            if let Err(e) = email_service
                .send_email_confirmation(&email, &username, &token)
                .await
            {
                log::error!("Failed to send confirmation email to {}: {}", email, e);
            }
        });
    }

    fn spawn_reset_email(&self, email: String, username: String, token: String) {
        let email_service = self.email_service.clone();
        tokio::spawn(async move {
            if let Err(e) = email_service
                .send_reset_password_email(&email, &username, &token)
                .await
            {
                log::error!("Failed to send password reset email to {}: {}", email, e);
            }
        });
    }

    /// Create an account and send its confirmation email
    pub async fn register(&self, body: UserCreate) -> AppResult<User> {
        let account = self.user_service.create_user(body).await?;
        self.spawn_confirmation_email(account.email.clone(), account.username.clone());
        Ok(account.into())
    }

    /// Exchange credentials for an access token
    pub async fn login(&self, form: LoginForm) -> AppResult<Token> {
        let account = self
            .user_service
            .authenticate(&form.username, &form.password)
            .await?;

        let access_token = self.jwt_service.create_access_token(&account.username)?;
        log::info!("User {} logged in", account.username);

        Ok(Token::bearer(access_token))
    }

    /// Resolve a bearer token to its account
    pub async fn current_user(&self, token: &str) -> AppResult<UserAccount> {
        let username = self.jwt_service.validate_access_token(token).map_err(|e| {
            log::warn!("Rejected access token: {}", e);
            AppError::Authentication(MSG_INVALID_CREDENTIALS.to_string())
        })?;

        match self.user_service.get_user_by_username(&username).await {
            Ok(account) => Ok(account),
            Err(crate::service::user::UserServiceError::UserNotFound) => {
                log::warn!("Access token for unknown user {}", username);
                Err(AppError::Authentication(MSG_INVALID_CREDENTIALS.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Follow a confirmation link
    pub async fn confirm_email(&self, token: &str) -> AppResult<MessageResponse> {
        let email = self.jwt_service.email_from_token(token)?;

        let account = self
            .user_service
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::BadRequest("Verification error".to_string()))?;

        if account.confirmed {
            return Ok(MessageResponse::new(MSG_ALREADY_CONFIRMED));
        }

        self.user_service.confirm_email(&account.email).await?;
        Ok(MessageResponse::new(MSG_EMAIL_CONFIRMED))
    }

    /// Re-send the confirmation email; unknown addresses get the same answer
    pub async fn request_email(&self, body: RequestEmail) -> AppResult<MessageResponse> {
        body.validate()?;

        if let Some(account) = self.user_service.find_user_by_email(&body.email).await? {
            if account.confirmed {
                return Ok(MessageResponse::new(MSG_ALREADY_CONFIRMED));
            }
            self.spawn_confirmation_email(account.email, account.username);
        }

        Ok(MessageResponse::new(MSG_CHECK_VERIFICATION))
    }

    /// Start a password reset by emailing a link that carries the new hash
    pub async fn request_password_reset(&self, body: ResetPassword) -> AppResult<MessageResponse> {
        body.validate()?;

        let account = match self.user_service.find_user_by_email(&body.email).await? {
            Some(account) => account,
            None => return Ok(MessageResponse::new(MSG_CHECK_EMAIL)),
        };

        if !account.confirmed {
            return Err(AppError::BadRequest("Email not confirmed".to_string()));
        }

        let password_hash = self.user_service.hash_password(&body.password)?;
        let token = self
            .jwt_service
            .create_reset_token(&account.email, &password_hash)?;

        self.spawn_reset_email(account.email, account.username, token);
        Ok(MessageResponse::new(MSG_CHECK_EMAIL))
    }

    /// Follow a password reset link
    pub async fn confirm_password_reset(&self, token: &str) -> AppResult<MessageResponse> {
        let (email, password_hash) = self.jwt_service.decode_reset_token(token)?;

        let account = self
            .user_service
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.user_service
            .set_password_hash(account.id, &password_hash)
            .await?;

        Ok(MessageResponse::new(MSG_PASSWORD_CHANGED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryUserRepository;
    use crate::service::email_service::{Mailer, OutgoingEmail};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct ChannelMailer(mpsc::UnboundedSender<OutgoingEmail>);

    #[async_trait]
    impl Mailer for ChannelMailer {
        async fn deliver(&self, email: OutgoingEmail) -> AppResult<()> {
            let _ = self.0.send(email);
            Ok(())
        }
    }

    fn create_test_service() -> (AuthService, mpsc::UnboundedReceiver<OutgoingEmail>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let users = Arc::new(
            UserService::new(Arc::new(InMemoryUserRepository::new())).with_bcrypt_cost(4),
        );
        let jwt = Arc::new(JwtService::new("test_secret".to_string()));
        let email = Arc::new(
            EmailService::new(Arc::new(ChannelMailer(tx)), "http://test", "Contacts").unwrap(),
        );
        (AuthService::new(users, jwt, email), rx)
    }

    fn signup() -> UserCreate {
        UserCreate {
            username: "agent007".to_string(),
            email: "agent007@gmail.com".to_string(),
            password: "12345678".to_string(),
        }
    }

    fn token_from_link(email: &OutgoingEmail, marker: &str) -> String {
        let start = email.text_body.find(marker).unwrap() + marker.len();
        email.text_body[start..]
            .split_whitespace()
            .next()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_register_confirm_login() {
        let (auth, mut outbox) = create_test_service();
        let user = auth.register(signup()).await.unwrap();
        assert_eq!(user.username, "agent007");

        let err = auth
            .login(LoginForm {
                username: "agent007".to_string(),
                password: "12345678".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(ref m) if m == "Email is not confirmed"));

        let mail = outbox.recv().await.unwrap();
        let token = token_from_link(&mail, "/api/auth/confirmed_email/");

        assert_eq!(auth.confirm_email(&token).await.unwrap().message, MSG_EMAIL_CONFIRMED);
        assert_eq!(auth.confirm_email(&token).await.unwrap().message, MSG_ALREADY_CONFIRMED);

        let token = auth
            .login(LoginForm {
                username: "agent007".to_string(),
                password: "12345678".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(token.token_type, "bearer");

        let current = auth.current_user(&token.access_token).await.unwrap();
        assert_eq!(current.id, user.id);
    }

    #[tokio::test]
    async fn test_current_user_rejects_other_token_types() {
        let (auth, _outbox) = create_test_service();
        auth.register(signup()).await.unwrap();

        let email_token = auth.jwt_service.create_email_token("agent007@gmail.com").unwrap();
        let err = auth.current_user(&email_token).await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(ref m) if m == MSG_INVALID_CREDENTIALS));

        let ghost = auth.jwt_service.create_access_token("ghost").unwrap();
        assert!(auth.current_user(&ghost).await.is_err());
    }

    #[tokio::test]
    async fn test_confirm_email_for_unknown_address() {
        let (auth, _outbox) = create_test_service();
        let token = auth.jwt_service.create_email_token("ghost@gmail.com").unwrap();

        let err = auth.confirm_email(&token).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Verification error"));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (auth, mut outbox) = create_test_service();
        auth.user_service
            .create_account(signup(), true, crate::models::Role::User)
            .await
            .unwrap();

        let response = auth
            .request_password_reset(ResetPassword {
                email: "agent007@gmail.com".to_string(),
                password: "new_password".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.message, MSG_CHECK_EMAIL);

        let mail = outbox.recv().await.unwrap();
        let token = token_from_link(&mail, "/api/auth/confirm_reset_password/");
        assert_eq!(
            auth.confirm_password_reset(&token).await.unwrap().message,
            MSG_PASSWORD_CHANGED
        );

        let old = auth
            .login(LoginForm {
                username: "agent007".to_string(),
                password: "12345678".to_string(),
            })
            .await;
        assert!(old.is_err());

        let new = auth
            .login(LoginForm {
                username: "agent007".to_string(),
                password: "new_password".to_string(),
            })
            .await;
        assert!(new.is_ok());
    }

    #[tokio::test]
    async fn test_password_reset_requires_confirmed_email() {
        let (auth, _outbox) = create_test_service();
        auth.register(signup()).await.unwrap();

        let err = auth
            .request_password_reset(ResetPassword {
                email: "agent007@gmail.com".to_string(),
                password: "new_password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Email not confirmed"));

        let unknown = auth
            .request_password_reset(ResetPassword {
                email: "ghost@gmail.com".to_string(),
                password: "new_password".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(unknown.message, MSG_CHECK_EMAIL);
    }

    #[tokio::test]
    async fn test_request_email_answers() {
        let (auth, mut outbox) = create_test_service();
        auth.register(signup()).await.unwrap();
        outbox.recv().await.unwrap();

        let body = RequestEmail {
            email: "agent007@gmail.com".to_string(),
        };
        let response = auth.request_email(body.clone()).await.unwrap();
        assert_eq!(response.message, MSG_CHECK_VERIFICATION);
        assert_eq!(outbox.recv().await.unwrap().to, "agent007@gmail.com");

        auth.user_service.confirm_email("agent007@gmail.com").await.unwrap();
        let response = auth.request_email(body).await.unwrap();
        assert_eq!(response.message, MSG_ALREADY_CONFIRMED);

        let response = auth
            .request_email(RequestEmail {
                email: "ghost@gmail.com".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.message, MSG_CHECK_VERIFICATION);
    }
}
