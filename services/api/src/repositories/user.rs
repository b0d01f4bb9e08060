//! User repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::models::User;

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user for this Telegram identity, or refresh the display
    /// fields of the existing row.
    ///
    /// A single conditional statement, so concurrent logins with the
    /// same `telegram_id` cannot race into duplicate rows, and the
    /// internal id is stable across re-authentication.
    pub async fn upsert(
        &self,
        telegram_id: i64,
        first_name: Option<&str>,
        last_name: Option<&str>,
        username: Option<&str>,
    ) -> DatabaseResult<User> {
        info!("Upserting user with telegram id {}", telegram_id);

        let row = sqlx::query(
            r#"
            INSERT INTO users (telegram_id, first_name, last_name, username)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (telegram_id)
            DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                username = EXCLUDED.username
            RETURNING id, telegram_id, first_name, last_name, username, created_at
            "#,
        )
        .bind(telegram_id)
        .bind(first_name)
        .bind(last_name)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(user_from_row(&row))
    }

    /// Find a user by internal id
    pub async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, telegram_id, first_name, last_name, username, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Find a user by Telegram identity
    pub async fn find_by_telegram_id(&self, telegram_id: i64) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, telegram_id, first_name, last_name, username, created_at
            FROM users
            WHERE telegram_id = $1
            "#,
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(user_from_row))
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        telegram_id: row.get("telegram_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        username: row.get("username"),
        created_at: row.get("created_at"),
    }
}
