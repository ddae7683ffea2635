//! User Service Implementation
//!
//! Core business logic for user accounts: registration, credential checks,
//! confirmation state, avatars, passwords and roles.

use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

use crate::models::{requests::UserCreate, NewUser, Role, UserAccount};
use crate::repository::{constraints, RepositoryError, UserRepository};
use crate::utils::{
    error::AppError,
    security::{gravatar_url, hash_password_with_cost, verify_password, DEFAULT_BCRYPT_COST},
    validation::normalize_email,
};

/// Custom error types for the user service
#[derive(Error, Debug)]
pub enum UserServiceError {
    /// User with the specified identifier was not found
    #[error("User not found")]
    UserNotFound,

    /// Attempted to register with an email that already exists
    #[error("Email already exists")]
    EmailAlreadyExists,

    /// Attempted to register with a username that already exists
    #[error("Username already exists")]
    UsernameAlreadyExists,

    /// Invalid login credentials provided
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Correct credentials but the email was never confirmed
    #[error("Email is not confirmed")]
    EmailNotConfirmed,

    /// Input validation failed
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Password hashing operation failed
    #[error("Password hashing error: {0}")]
    HashingError(#[from] bcrypt::BcryptError),
}

impl From<RepositoryError> for UserServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UniqueViolation(name) if name == constraints::USERS_USERNAME => {
                UserServiceError::UsernameAlreadyExists
            }
            RepositoryError::UniqueViolation(_) => UserServiceError::EmailAlreadyExists,
            RepositoryError::Database(e) => UserServiceError::DatabaseError(e),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::UserNotFound => AppError::NotFound("User not found".to_string()),
            UserServiceError::EmailAlreadyExists => {
                AppError::Conflict("You can't use this email".to_string())
            }
            UserServiceError::UsernameAlreadyExists => {
                AppError::Conflict("You can't use this username".to_string())
            }
            UserServiceError::InvalidCredentials => {
                AppError::Authentication("Wrong credentials".to_string())
            }
            UserServiceError::EmailNotConfirmed => {
                AppError::Authentication("Email is not confirmed".to_string())
            }
            UserServiceError::ValidationError(e) => AppError::InvalidFields(e),
            UserServiceError::DatabaseError(e) => AppError::Database(e),
            UserServiceError::HashingError(e) => AppError::HashingError(e),
        }
    }
}

/// Result type for user service operations
pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// Core user service providing account operations and business logic
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,

    /// bcrypt cost factor for password hashing (higher = more secure but slower)
    bcrypt_cost: u32,
}

impl UserService {
    /// Creates a new UserService backed by the given repository
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self {
            repository,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// Overrides the bcrypt cost factor
    pub fn with_bcrypt_cost(mut self, bcrypt_cost: u32) -> Self {
        self.bcrypt_cost = bcrypt_cost;
        self
    }

    /// Registers a new, unconfirmed account with the `user` role
    pub async fn create_user(&self, request: UserCreate) -> UserServiceResult<UserAccount> {
        self.create_account(request, false, Role::User).await
    }

    /// Creates an account with an explicit confirmation state and role
    ///
    /// The email is checked before the username so a request clashing on both
    /// reports the email.
    pub async fn create_account(
        &self,
        request: UserCreate,
        confirmed: bool,
        role: Role,
    ) -> UserServiceResult<UserAccount> {
        request.validate()?;

        let email = normalize_email(&request.email);

        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(UserServiceError::EmailAlreadyExists);
        }

        if self
            .repository
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(UserServiceError::UsernameAlreadyExists);
        }

        let hashed_password = hash_password_with_cost(&request.password, self.bcrypt_cost)?;

        let account = self
            .repository
            .create_user(NewUser {
                username: request.username,
                avatar: Some(gravatar_url(&email)),
                email,
                hashed_password,
                confirmed,
                role,
            })
            .await?;

        log::info!("Created user {} (id {})", account.username, account.id);
        Ok(account)
    }

    /// Retrieves a user by their unique ID
    pub async fn get_user_by_id(&self, user_id: i64) -> UserServiceResult<UserAccount> {
        self.repository
            .find_by_id(user_id)
            .await?
            .ok_or(UserServiceError::UserNotFound)
    }

    /// Retrieves a user by their username
    pub async fn get_user_by_username(&self, username: &str) -> UserServiceResult<UserAccount> {
        self.repository
            .find_by_username(username)
            .await?
            .ok_or(UserServiceError::UserNotFound)
    }

    /// Looks up a user by email address; the address is normalized first
    pub async fn find_user_by_email(&self, email: &str) -> UserServiceResult<Option<UserAccount>> {
        Ok(self
            .repository
            .find_by_email(&normalize_email(email))
            .await?)
    }

    /// Checks a username/password pair and requires a confirmed email
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> UserServiceResult<UserAccount> {
        let account = match self.repository.find_by_username(username).await? {
            Some(account) => account,
            None => {
                log::warn!("Login attempt for unknown user {}", username);
                return Err(UserServiceError::InvalidCredentials);
            }
        };

        if !verify_password(password, &account.hashed_password)? {
            log::warn!("Wrong password for user {}", username);
            return Err(UserServiceError::InvalidCredentials);
        }

        if !account.confirmed {
            log::warn!("Login attempt with unconfirmed email for user {}", username);
            return Err(UserServiceError::EmailNotConfirmed);
        }

        Ok(account)
    }

    /// Hashes a password with the configured cost
    pub fn hash_password(&self, password: &str) -> UserServiceResult<String> {
        Ok(hash_password_with_cost(password, self.bcrypt_cost)?)
    }

    /// Marks the account with this email as confirmed
    pub async fn confirm_email(&self, email: &str) -> UserServiceResult<()> {
        let email = normalize_email(email);
        if !self.repository.confirm_email(&email).await? {
            return Err(UserServiceError::UserNotFound);
        }

        log::info!("Confirmed email {}", email);
        Ok(())
    }

    /// Stores a new avatar URL for the account with this email
    pub async fn update_avatar(&self, email: &str, url: &str) -> UserServiceResult<UserAccount> {
        self.repository
            .update_avatar_url(&normalize_email(email), url)
            .await?
            .ok_or(UserServiceError::UserNotFound)
    }

    /// Replaces the stored password hash
    pub async fn set_password_hash(
        &self,
        user_id: i64,
        hashed_password: &str,
    ) -> UserServiceResult<()> {
        if !self
            .repository
            .update_password(user_id, hashed_password)
            .await?
        {
            return Err(UserServiceError::UserNotFound);
        }

        log::info!("Password changed for user id {}", user_id);
        Ok(())
    }

    /// Changes a user's role
    pub async fn set_role(&self, username: &str, role: Role) -> UserServiceResult<UserAccount> {
        let account = self
            .repository
            .set_role(username, role)
            .await?
            .ok_or(UserServiceError::UserNotFound)?;

        log::info!("User {} now has role {}", username, role);
        Ok(account)
    }

    /// Performs a health check on the backing store
    pub async fn health_check(&self) -> UserServiceResult<()> {
        self.repository.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryUserRepository;

    fn create_test_service() -> UserService {
        UserService::new(Arc::new(InMemoryUserRepository::new())).with_bcrypt_cost(4)
    }

    fn create_test_user_request() -> UserCreate {
        UserCreate {
            username: "agent007".to_string(),
            email: "Agent007@Gmail.com".to_string(),
            password: "12345678".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_normalizes_and_hashes() {
        let service = create_test_service();
        let user = service.create_user(create_test_user_request()).await.unwrap();

        assert_eq!(user.email, "agent007@gmail.com");
        assert_ne!(user.hashed_password, "12345678");
        assert!(!user.confirmed);
        assert_eq!(user.role, Role::User);
        assert_eq!(user.avatar, Some(gravatar_url("agent007@gmail.com")));
    }

    #[tokio::test]
    async fn test_create_user_then_fetch() {
        let service = create_test_service();
        let created = service.create_user(create_test_user_request()).await.unwrap();

        let by_id = service.get_user_by_id(created.id).await.unwrap();
        let by_name = service.get_user_by_username("agent007").await.unwrap();
        let by_email = service
            .find_user_by_email(" AGENT007@gmail.com ")
            .await
            .unwrap()
            .unwrap();

        for fetched in [by_id, by_name, by_email] {
            assert_eq!(fetched.id, created.id);
            assert_eq!(fetched.username, created.username);
            assert_eq!(fetched.email, created.email);
            assert_eq!(fetched.avatar, created.avatar);
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_checked_before_username() {
        let service = create_test_service();
        service.create_user(create_test_user_request()).await.unwrap();

        let err = service
            .create_user(create_test_user_request())
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::EmailAlreadyExists));

        let mut request = create_test_user_request();
        request.email = "other@gmail.com".to_string();
        let err = service.create_user(request).await.unwrap_err();
        assert!(matches!(err, UserServiceError::UsernameAlreadyExists));
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let service = create_test_service();
        let mut request = create_test_user_request();
        request.password = "123".to_string();

        let err = service.create_user(request).await.unwrap_err();
        assert!(matches!(err, UserServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let service = create_test_service();
        service.create_user(create_test_user_request()).await.unwrap();

        let err = service.authenticate("agent007", "12345678").await.unwrap_err();
        assert!(matches!(err, UserServiceError::EmailNotConfirmed));

        service.confirm_email("agent007@gmail.com").await.unwrap();

        assert!(service.authenticate("agent007", "12345678").await.is_ok());
        assert!(matches!(
            service.authenticate("agent007", "wrong").await.unwrap_err(),
            UserServiceError::InvalidCredentials
        ));
        assert!(matches!(
            service.authenticate("nobody", "12345678").await.unwrap_err(),
            UserServiceError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_new_password_replaces_old() {
        let service = create_test_service();
        let user = service
            .create_account(create_test_user_request(), true, Role::User)
            .await
            .unwrap();

        let hash = service.hash_password("new_password").unwrap();
        service.set_password_hash(user.id, &hash).await.unwrap();

        assert!(service.authenticate("agent007", "new_password").await.is_ok());
        assert!(service.authenticate("agent007", "12345678").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_user_operations() {
        let service = create_test_service();

        assert!(matches!(
            service.confirm_email("nobody@gmail.com").await.unwrap_err(),
            UserServiceError::UserNotFound
        ));
        assert!(matches!(
            service.update_avatar("nobody@gmail.com", "url").await.unwrap_err(),
            UserServiceError::UserNotFound
        ));
        assert!(matches!(
            service.set_role("nobody", Role::Admin).await.unwrap_err(),
            UserServiceError::UserNotFound
        ));
    }

    #[test]
    fn test_error_messages() {
        let cases = [
            (UserServiceError::EmailAlreadyExists, "You can't use this email"),
            (UserServiceError::UsernameAlreadyExists, "You can't use this username"),
            (UserServiceError::InvalidCredentials, "Wrong credentials"),
            (UserServiceError::EmailNotConfirmed, "Email is not confirmed"),
        ];

        for (err, expected) in cases {
            let message = match AppError::from(err) {
                AppError::Conflict(m) | AppError::Authentication(m) => m,
                other => panic!("unexpected error {:?}", other),
            };
            assert_eq!(message, expected);
        }
    }
}
