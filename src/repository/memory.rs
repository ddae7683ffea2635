//! In-memory repositories
//!
//! Mirror the PostgreSQL behaviour closely enough for the HTTP tests: ids are
//! sequential, unique constraints report the same names as the schema and
//! contact filters match case-insensitively.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use super::{
    constraints, ContactRepository, RepositoryError, RepositoryResult, UserRepository,
};
use crate::database::Pagination;
use crate::models::{Contact, ContactFilter, ContactModel, NewUser, Role, UserAccount};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<UserAccount>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<UserAccount> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::UniqueViolation(
                constraints::USERS_USERNAME.to_string(),
            ));
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::UniqueViolation(
                constraints::USERS_EMAIL.to_string(),
            ));
        }

        let account = UserAccount {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
            avatar: user.avatar,
            confirmed: user.confirmed,
            role: user.role,
            created_at: Utc::now(),
        };
        users.push(account.clone());

        Ok(account)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<UserAccount>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<UserAccount>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<UserAccount>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn confirm_email(&self, email: &str) -> RepositoryResult<bool> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.confirmed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_avatar_url(
        &self,
        email: &str,
        url: &str,
    ) -> RepositoryResult<Option<UserAccount>> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.email == email).map(|user| {
            user.avatar = Some(url.to_string());
            user.clone()
        }))
    }

    async fn update_password(
        &self,
        user_id: i64,
        hashed_password: &str,
    ) -> RepositoryResult<bool> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.hashed_password = hashed_password.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_role(&self, username: &str, role: Role) -> RepositoryResult<Option<UserAccount>> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.username == username).map(|user| {
            user.role = role;
            user.clone()
        }))
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryContactRepository {
    contacts: RwLock<Vec<Contact>>,
    next_id: AtomicI64,
}

impl InMemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(
        contacts: &[Contact],
        user_id: i64,
        body: &ContactModel,
        exclude_id: Option<i64>,
    ) -> RepositoryResult<()> {
        let others = contacts
            .iter()
            .filter(|c| c.user_id == user_id && Some(c.id) != exclude_id);

        for contact in others {
            if contact.email == body.email {
                return Err(RepositoryError::UniqueViolation(
                    constraints::CONTACTS_USER_EMAIL.to_string(),
                ));
            }
            if contact.phone_number == body.phone_number {
                return Err(RepositoryError::UniqueViolation(
                    constraints::CONTACTS_USER_PHONE.to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn list_contacts(
        &self,
        user_id: i64,
        filter: &ContactFilter,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Contact>> {
        let contacts = self.contacts.read().await;
        Ok(contacts
            .iter()
            .filter(|c| c.user_id == user_id && filter.matches(c))
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect())
    }

    async fn get_contact(
        &self,
        user_id: i64,
        contact_id: i64,
    ) -> RepositoryResult<Option<Contact>> {
        let contacts = self.contacts.read().await;
        Ok(contacts
            .iter()
            .find(|c| c.id == contact_id && c.user_id == user_id)
            .cloned())
    }

    async fn create_contact(&self, user_id: i64, body: &ContactModel) -> RepositoryResult<Contact> {
        let mut contacts = self.contacts.write().await;
        Self::check_unique(&contacts, user_id, body, None)?;

        let contact = Contact {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id,
            first_name: body.first_name.clone(),
            last_name: body.last_name.clone(),
            email: body.email.clone(),
            phone_number: body.phone_number.clone(),
            birthday_date: body.birthday_date,
            info: body.info.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        contacts.push(contact.clone());

        Ok(contact)
    }

    async fn update_contact(
        &self,
        user_id: i64,
        contact_id: i64,
        body: &ContactModel,
    ) -> RepositoryResult<Option<Contact>> {
        let mut contacts = self.contacts.write().await;
        Self::check_unique(&contacts, user_id, body, Some(contact_id))?;

        Ok(contacts
            .iter_mut()
            .find(|c| c.id == contact_id && c.user_id == user_id)
            .map(|contact| {
                contact.first_name = body.first_name.clone();
                contact.last_name = body.last_name.clone();
                contact.email = body.email.clone();
                contact.phone_number = body.phone_number.clone();
                contact.birthday_date = body.birthday_date;
                contact.info = body.info.clone();
                contact.updated_at = Some(Utc::now());
                contact.clone()
            }))
    }

    async fn delete_contact(
        &self,
        user_id: i64,
        contact_id: i64,
    ) -> RepositoryResult<Option<Contact>> {
        let mut contacts = self.contacts.write().await;
        let position = contacts
            .iter()
            .position(|c| c.id == contact_id && c.user_id == user_id);

        Ok(position.map(|index| contacts.remove(index)))
    }

    async fn contact_exists(
        &self,
        user_id: i64,
        email: &str,
        phone_number: &str,
        exclude_id: Option<i64>,
    ) -> RepositoryResult<bool> {
        let contacts = self.contacts.read().await;
        Ok(contacts.iter().any(|c| {
            c.user_id == user_id
                && Some(c.id) != exclude_id
                && (c.email == email || c.phone_number == phone_number)
        }))
    }

    async fn contacts_with_birthdays(
        &self,
        user_id: i64,
        keys: &[String],
    ) -> RepositoryResult<Vec<Contact>> {
        let contacts = self.contacts.read().await;
        Ok(contacts
            .iter()
            .filter(|c| {
                c.user_id == user_id
                    && keys.contains(&c.birthday_date.format("%m-%d").to_string())
            })
            .cloned()
            .collect())
    }
}
