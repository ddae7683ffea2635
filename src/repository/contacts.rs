//! PostgreSQL contact repository

use async_trait::async_trait;
use sqlx::PgPool;

use super::{map_sqlx_error, ContactRepository, RepositoryResult};
use crate::database::Pagination;
use crate::models::{Contact, ContactFilter, ContactModel};
use crate::utils::validation::escape_like;

const CONTACT_COLUMNS: &str = "id, user_id, first_name, last_name, email, phone_number, \
     birthday_date, info, created_at, updated_at";

#[derive(Clone)]
pub struct PgContactRepository {
    db_pool: PgPool,
}

impl PgContactRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

/// `%value%` pattern with wildcards in the value escaped
fn contains_pattern(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|v| format!("%{}%", escape_like(v)))
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn list_contacts(
        &self,
        user_id: i64,
        filter: &ContactFilter,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Contact>> {
        let query = format!(
            r#"
            SELECT {CONTACT_COLUMNS}
            FROM contacts
            WHERE user_id = $1
              AND ($2::TEXT IS NULL OR first_name ILIKE $2)
              AND ($3::TEXT IS NULL OR last_name ILIKE $3)
              AND ($4::TEXT IS NULL OR email ILIKE $4)
            ORDER BY id
            LIMIT $5 OFFSET $6
            "#
        );

        Ok(sqlx::query_as::<_, Contact>(&query)
            .bind(user_id)
            .bind(contains_pattern(&filter.first_name))
            .bind(contains_pattern(&filter.last_name))
            .bind(contains_pattern(&filter.email))
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.db_pool)
            .await?)
    }

    async fn get_contact(
        &self,
        user_id: i64,
        contact_id: i64,
    ) -> RepositoryResult<Option<Contact>> {
        let query =
            format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1 AND user_id = $2");

        Ok(sqlx::query_as::<_, Contact>(&query)
            .bind(contact_id)
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?)
    }

    async fn create_contact(&self, user_id: i64, body: &ContactModel) -> RepositoryResult<Contact> {
        let query = format!(
            r#"
            INSERT INTO contacts
                (user_id, first_name, last_name, email, phone_number, birthday_date, info)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CONTACT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Contact>(&query)
            .bind(user_id)
            .bind(&body.first_name)
            .bind(&body.last_name)
            .bind(&body.email)
            .bind(&body.phone_number)
            .bind(body.birthday_date)
            .bind(&body.info)
            .fetch_one(&self.db_pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_contact(
        &self,
        user_id: i64,
        contact_id: i64,
        body: &ContactModel,
    ) -> RepositoryResult<Option<Contact>> {
        let query = format!(
            r#"
            UPDATE contacts
            SET first_name = $3, last_name = $4, email = $5, phone_number = $6,
                birthday_date = $7, info = $8, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {CONTACT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Contact>(&query)
            .bind(contact_id)
            .bind(user_id)
            .bind(&body.first_name)
            .bind(&body.last_name)
            .bind(&body.email)
            .bind(&body.phone_number)
            .bind(body.birthday_date)
            .bind(&body.info)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_contact(
        &self,
        user_id: i64,
        contact_id: i64,
    ) -> RepositoryResult<Option<Contact>> {
        let query = format!(
            "DELETE FROM contacts WHERE id = $1 AND user_id = $2 RETURNING {CONTACT_COLUMNS}"
        );

        Ok(sqlx::query_as::<_, Contact>(&query)
            .bind(contact_id)
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?)
    }

    async fn contact_exists(
        &self,
        user_id: i64,
        email: &str,
        phone_number: &str,
        exclude_id: Option<i64>,
    ) -> RepositoryResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM contacts
                WHERE user_id = $1
                  AND (email = $2 OR phone_number = $3)
                  AND ($4::BIGINT IS NULL OR id <> $4)
            )
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(phone_number)
        .bind(exclude_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(exists)
    }

    async fn contacts_with_birthdays(
        &self,
        user_id: i64,
        keys: &[String],
    ) -> RepositoryResult<Vec<Contact>> {
        let query = format!(
            r#"
            SELECT {CONTACT_COLUMNS}
            FROM contacts
            WHERE user_id = $1 AND to_char(birthday_date, 'MM-DD') = ANY($2)
            "#
        );

        Ok(sqlx::query_as::<_, Contact>(&query)
            .bind(user_id)
            .bind(keys)
            .fetch_all(&self.db_pool)
            .await?)
    }
}
