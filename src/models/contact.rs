//! Contact Model
//!
//! Contact records owned by a user, plus the payloads used to create, update
//! and search them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validation::{email_validator, phone_validator};

/// Request payload for creating or replacing a contact
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ContactModel {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub first_name: String,

    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub last_name: String,

    /// Unique per owner
    #[validate(custom(function = "email_validator"))]
    #[validate(length(min = 7, max = 80, message = "Email must be between 7 and 80 characters"))]
    pub email: String,

    /// Unique per owner
    #[validate(length(
        min = 7,
        max = 15,
        message = "Phone number must be between 7 and 15 characters"
    ))]
    #[validate(custom(function = "phone_validator"))]
    pub phone_number: String,

    pub birthday_date: NaiveDate,

    #[serde(default)]
    #[validate(length(max = 500, message = "Info must be at most 500 characters"))]
    pub info: Option<String>,
}

/// Stored contact row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birthday_date: NaiveDate,
    pub info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Contact representation for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birthday_date: NaiveDate,
    pub info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Contact> for ContactResponse {
    fn from(contact: Contact) -> Self {
        ContactResponse {
            id: contact.id,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            phone_number: contact.phone_number,
            birthday_date: contact.birthday_date,
            info: contact.info,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        }
    }
}

/// Optional substring filters for listing contacts
///
/// Each present filter matches case-insensitively; all present filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl ContactFilter {
    /// Drops blank filters so `?first_name=` behaves like no filter
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        ContactFilter {
            first_name: keep(self.first_name),
            last_name: keep(self.last_name),
            email: keep(self.email),
        }
    }

    /// In-process equivalent of the SQL `ILIKE '%value%'` filters
    pub fn matches(&self, contact: &Contact) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            match needle {
                Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
                None => true,
            }
        }

        contains(&contact.first_name, &self.first_name)
            && contains(&contact.last_name, &self.last_name)
            && contains(&contact.email, &self.email)
    }
}

/// Query string for `GET /contacts`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListContactsQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl ListContactsQuery {
    pub fn filter(&self) -> ContactFilter {
        ContactFilter {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
        .normalized()
    }
}

/// Query string for `GET /contacts/birthdays`
#[derive(Debug, Clone, Deserialize)]
pub struct BirthdayQuery {
    pub days: Option<i64>,
}
