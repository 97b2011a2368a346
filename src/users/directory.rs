//! Account lookup and persistence
//!
//! [`UserDirectory`] is the seam the authentication core talks to. The SQLite
//! implementation also carries the profile and admin operations used by the
//! `users` and `admin` handlers.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error};

use super::models::{Account, NewAccount};

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, sqlx::Error>;

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Account>, sqlx::Error>;

    async fn create_account(&self, account: NewAccount) -> Result<Account, sqlx::Error>;

    /// Stamp `last_login` with the current time and return the stored row
    async fn update_last_login(&self, account: &Account) -> Result<Account, sqlx::Error>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Account>, sqlx::Error>;
}

/// True when the error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Debug, Clone)]
pub struct SqliteUserDirectory {
    pool: SqlitePool,
}

impl SqliteUserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Account, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn update_full_name(
        &self,
        id: i64,
        full_name: Option<&str>,
    ) -> Result<Option<Account>, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET full_name = ? WHERE id = ?")
            .bind(full_name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_by_id(id).await.map(Some)
    }

    pub async fn update_password_hash(&self, id: i64, hashed_password: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET hashed_password = ? WHERE id = ?")
            .bind(hashed_password)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_picture(&self, id: i64, picture: &str) -> Result<Option<Account>, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET picture = ? WHERE id = ?")
            .bind(picture)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_by_id(id).await.map(Some)
    }

    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_account(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM users WHERE google_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, sqlx::Error> {
        // OAuth sign-ups count as a login at creation time
        let last_login = account.google_id.as_ref().map(|_| Utc::now());

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, hashed_password, full_name, google_id, picture, is_verified, is_active, created_at, last_login)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.email)
        .bind(account.hashed_password.as_deref())
        .bind(account.full_name.as_deref())
        .bind(account.google_id.as_deref())
        .bind(account.picture.as_deref())
        .bind(account.is_verified)
        .bind(account.is_active)
        .bind(Utc::now())
        .bind(last_login)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if !is_unique_violation(&e) {
                error!(error = %e, "Database error inserting new account");
            }
            e
        })?;

        let id = result.last_insert_rowid();
        debug!(user_id = id, "Account row inserted");
        self.fetch_by_id(id).await
    }

    async fn update_last_login(&self, account: &Account) -> Result<Account, sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(account.id)
            .execute(&self.pool)
            .await?;
        self.fetch_by_id(account.id).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
