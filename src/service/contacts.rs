//! Contact Service Implementation
//!
//! CRUD, search and upcoming-birthday queries over a user's contacts.

use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

use crate::database::Pagination;
use crate::models::{Contact, ContactFilter, ContactModel};
use crate::repository::{ContactRepository, RepositoryError};
use crate::service::birthdays::{self, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use crate::utils::{error::AppError, validation::normalize_email};

#[derive(Error, Debug)]
pub enum ContactServiceError {
    #[error("Contact not found")]
    NotFound,

    /// Another contact of the same owner already uses the email or phone
    #[error("Contact with email '{email}' or phone '{phone_number}' already exists.")]
    Duplicate { email: String, phone_number: String },

    #[error("days must be between 1 and 365")]
    InvalidWindow,

    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<ContactServiceError> for AppError {
    fn from(err: ContactServiceError) -> Self {
        match err {
            ContactServiceError::NotFound => AppError::NotFound(err.to_string()),
            ContactServiceError::Duplicate { .. } => AppError::BadRequest(err.to_string()),
            ContactServiceError::InvalidWindow => AppError::Validation(err.to_string()),
            ContactServiceError::ValidationError(e) => AppError::InvalidFields(e),
            ContactServiceError::DatabaseError(e) => AppError::Database(e),
        }
    }
}

pub type ContactServiceResult<T> = Result<T, ContactServiceError>;

#[derive(Clone)]
pub struct ContactService {
    repository: Arc<dyn ContactRepository>,
}

impl ContactService {
    pub fn new(repository: Arc<dyn ContactRepository>) -> Self {
        Self { repository }
    }

    /// Validates the body and normalizes the email address
    fn prepare(body: ContactModel) -> ContactServiceResult<ContactModel> {
        body.validate()?;

        Ok(ContactModel {
            email: normalize_email(&body.email),
            phone_number: body.phone_number.trim().to_string(),
            ..body
        })
    }

    fn duplicate(body: &ContactModel) -> ContactServiceError {
        ContactServiceError::Duplicate {
            email: body.email.clone(),
            phone_number: body.phone_number.clone(),
        }
    }

    /// Maps a write failure, turning unique violations into `Duplicate`
    fn write_error(err: RepositoryError, body: &ContactModel) -> ContactServiceError {
        match err {
            RepositoryError::UniqueViolation(_) => Self::duplicate(body),
            RepositoryError::Database(e) => ContactServiceError::DatabaseError(e),
        }
    }

    pub async fn list_contacts(
        &self,
        user_id: i64,
        filter: ContactFilter,
        pagination: Pagination,
    ) -> ContactServiceResult<Vec<Contact>> {
        self.repository
            .list_contacts(user_id, &filter.normalized(), pagination)
            .await
            .map_err(read_error)
    }

    pub async fn get_contact(&self, user_id: i64, contact_id: i64) -> ContactServiceResult<Contact> {
        self.repository
            .get_contact(user_id, contact_id)
            .await
            .map_err(read_error)?
            .ok_or(ContactServiceError::NotFound)
    }

    pub async fn create_contact(
        &self,
        user_id: i64,
        body: ContactModel,
    ) -> ContactServiceResult<Contact> {
        let body = Self::prepare(body)?;

        if self
            .repository
            .contact_exists(user_id, &body.email, &body.phone_number, None)
            .await
            .map_err(read_error)?
        {
            return Err(Self::duplicate(&body));
        }

        let contact = self
            .repository
            .create_contact(user_id, &body)
            .await
            .map_err(|e| Self::write_error(e, &body))?;

        log::info!("User {} created contact {}", user_id, contact.id);
        Ok(contact)
    }

    pub async fn update_contact(
        &self,
        user_id: i64,
        contact_id: i64,
        body: ContactModel,
    ) -> ContactServiceResult<Contact> {
        let body = Self::prepare(body)?;

        // Missing contacts report 404 before any duplicate check
        self.get_contact(user_id, contact_id).await?;

        if self
            .repository
            .contact_exists(user_id, &body.email, &body.phone_number, Some(contact_id))
            .await
            .map_err(read_error)?
        {
            return Err(Self::duplicate(&body));
        }

        let contact = self
            .repository
            .update_contact(user_id, contact_id, &body)
            .await
            .map_err(|e| Self::write_error(e, &body))?
            .ok_or(ContactServiceError::NotFound)?;

        log::info!("User {} updated contact {}", user_id, contact.id);
        Ok(contact)
    }

    pub async fn delete_contact(
        &self,
        user_id: i64,
        contact_id: i64,
    ) -> ContactServiceResult<Contact> {
        let contact = self
            .repository
            .delete_contact(user_id, contact_id)
            .await
            .map_err(read_error)?
            .ok_or(ContactServiceError::NotFound)?;

        log::info!("User {} deleted contact {}", user_id, contact.id);
        Ok(contact)
    }

    /// Contacts whose next birthday falls within the coming `days` days
    pub async fn upcoming_birthdays(
        &self,
        user_id: i64,
        days: Option<i64>,
    ) -> ContactServiceResult<Vec<Contact>> {
        self.upcoming_birthdays_from(user_id, days, Utc::now().date_naive())
            .await
    }

    /// Same as [`upcoming_birthdays`](Self::upcoming_birthdays) with an explicit "today"
    pub async fn upcoming_birthdays_from(
        &self,
        user_id: i64,
        days: Option<i64>,
        today: NaiveDate,
    ) -> ContactServiceResult<Vec<Contact>> {
        let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(ContactServiceError::InvalidWindow);
        }

        let keys = birthdays::window_keys(today, days);
        let last_day = today + Duration::days(days);

        let mut contacts: Vec<(NaiveDate, Contact)> = self
            .repository
            .contacts_with_birthdays(user_id, &keys)
            .await
            .map_err(read_error)?
            .into_iter()
            .map(|c| (birthdays::next_birthday(c.birthday_date, today), c))
            .filter(|(next, _)| *next <= last_day)
            .collect();

        contacts.sort_by(|(a_date, a), (b_date, b)| a_date.cmp(b_date).then(a.id.cmp(&b.id)));

        Ok(contacts.into_iter().map(|(_, c)| c).collect())
    }
}

fn read_error(err: RepositoryError) -> ContactServiceError {
    match err {
        RepositoryError::Database(e) => ContactServiceError::DatabaseError(e),
        RepositoryError::UniqueViolation(name) => ContactServiceError::DatabaseError(
            sqlx::Error::Protocol(format!("unexpected unique violation on read: {}", name)),
        ),
    }
}
