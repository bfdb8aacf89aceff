//! Handle account lookups.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::user::{Role, User};

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    email: String,
    tutor_id: Option<i64>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user and its role using `id` field.
    pub async fn find_account(&self, user_id: i64) -> Result<Option<(User, Role)>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"SELECT u.id, u.username, u.email, t.id AS tutor_id
                FROM users u
                LEFT JOIN tutors t ON t.user_id = u.id
                WHERE u.id = ?"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            (
                User {
                    id: row.id,
                    username: row.username,
                    email: row.email,
                },
                Role::from_tutor(row.tutor_id),
            )
        }))
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, username, email FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, username, email FROM users WHERE email = ? COLLATE NOCASE",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?)
    }
}
