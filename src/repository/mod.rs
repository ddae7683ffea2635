//! Persistence Layer
//!
//! Storage traits for users and contacts. The PostgreSQL implementations are
//! used by the server; the in-memory ones back the test-suite and local runs
//! without a database.

use async_trait::async_trait;
use thiserror::Error;

use crate::database::Pagination;
use crate::models::{Contact, ContactFilter, ContactModel, NewUser, Role, UserAccount};

pub mod contacts;
pub mod memory;
pub mod users;

pub use contacts::PgContactRepository;
pub use memory::{InMemoryContactRepository, InMemoryUserRepository};
pub use users::PgUserRepository;

/// Unique constraint names shared by the schema and the in-memory stores
pub mod constraints {
    pub const USERS_USERNAME: &str = "users_username_key";
    pub const USERS_EMAIL: &str = "users_email_key";
    pub const CONTACTS_USER_EMAIL: &str = "contacts_user_email_key";
    pub const CONTACTS_USER_PHONE: &str = "contacts_user_phone_key";
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A unique constraint rejected the write; carries the constraint name
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Translate unique violations into [`RepositoryError::UniqueViolation`]
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::UniqueViolation(
                db_err.constraint().unwrap_or("unknown").to_string(),
            );
        }
    }
    RepositoryError::Database(err)
}

/// User account storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<UserAccount>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<UserAccount>>;

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<UserAccount>>;

    /// `email` must already be normalized
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<UserAccount>>;

    /// Marks the account confirmed; false when no account has this email
    async fn confirm_email(&self, email: &str) -> RepositoryResult<bool>;

    async fn update_avatar_url(
        &self,
        email: &str,
        url: &str,
    ) -> RepositoryResult<Option<UserAccount>>;

    async fn update_password(&self, user_id: i64, hashed_password: &str)
        -> RepositoryResult<bool>;

    async fn set_role(&self, username: &str, role: Role) -> RepositoryResult<Option<UserAccount>>;

    /// Cheap round-trip used by the health check
    async fn ping(&self) -> RepositoryResult<()>;
}

/// Contact storage; every operation is scoped to the owning user
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn list_contacts(
        &self,
        user_id: i64,
        filter: &ContactFilter,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Contact>>;

    async fn get_contact(&self, user_id: i64, contact_id: i64)
        -> RepositoryResult<Option<Contact>>;

    async fn create_contact(&self, user_id: i64, body: &ContactModel) -> RepositoryResult<Contact>;

    async fn update_contact(
        &self,
        user_id: i64,
        contact_id: i64,
        body: &ContactModel,
    ) -> RepositoryResult<Option<Contact>>;

    /// Returns the removed row
    async fn delete_contact(
        &self,
        user_id: i64,
        contact_id: i64,
    ) -> RepositoryResult<Option<Contact>>;

    /// Whether another contact of this user already uses the email or phone
    async fn contact_exists(
        &self,
        user_id: i64,
        email: &str,
        phone_number: &str,
        exclude_id: Option<i64>,
    ) -> RepositoryResult<bool>;

    /// Contacts whose birthday (`MM-DD`) is one of `keys`
    async fn contacts_with_birthdays(
        &self,
        user_id: i64,
        keys: &[String],
    ) -> RepositoryResult<Vec<Contact>>;
}
