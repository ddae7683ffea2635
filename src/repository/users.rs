//! PostgreSQL user repository

use async_trait::async_trait;
use sqlx::PgPool;

use super::{map_sqlx_error, RepositoryResult, UserRepository};
use crate::models::{NewUser, Role, UserAccount};

const USER_COLUMNS: &str =
    "id, username, email, hashed_password, avatar, confirmed, role, created_at";

#[derive(Clone)]
pub struct PgUserRepository {
    db_pool: PgPool,
}

impl PgUserRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<UserAccount> {
        let query = format!(
            r#"
            INSERT INTO users (username, email, hashed_password, avatar, confirmed, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, UserAccount>(&query)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.hashed_password)
            .bind(&user.avatar)
            .bind(user.confirmed)
            .bind(user.role)
            .fetch_one(&self.db_pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<UserAccount>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        Ok(sqlx::query_as::<_, UserAccount>(&query)
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?)
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<UserAccount>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");

        Ok(sqlx::query_as::<_, UserAccount>(&query)
            .bind(username)
            .fetch_optional(&self.db_pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<UserAccount>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        Ok(sqlx::query_as::<_, UserAccount>(&query)
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await?)
    }

    async fn confirm_email(&self, email: &str) -> RepositoryResult<bool> {
        let result = sqlx::query("UPDATE users SET confirmed = TRUE WHERE email = $1")
            .bind(email)
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_avatar_url(
        &self,
        email: &str,
        url: &str,
    ) -> RepositoryResult<Option<UserAccount>> {
        let query =
            format!("UPDATE users SET avatar = $2 WHERE email = $1 RETURNING {USER_COLUMNS}");

        Ok(sqlx::query_as::<_, UserAccount>(&query)
            .bind(email)
            .bind(url)
            .fetch_optional(&self.db_pool)
            .await?)
    }

    async fn update_password(
        &self,
        user_id: i64,
        hashed_password: &str,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query("UPDATE users SET hashed_password = $2 WHERE id = $1")
            .bind(user_id)
            .bind(hashed_password)
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_role(&self, username: &str, role: Role) -> RepositoryResult<Option<UserAccount>> {
        let query =
            format!("UPDATE users SET role = $2 WHERE username = $1 RETURNING {USER_COLUMNS}");

        Ok(sqlx::query_as::<_, UserAccount>(&query)
            .bind(username)
            .bind(role)
            .fetch_optional(&self.db_pool)
            .await?)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.db_pool).await?;
        Ok(())
    }
}
