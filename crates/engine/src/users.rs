//! User lookups used by the auth guards and the emission job.

use sqlx::PgPool;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::User;

pub struct UserService;

impl UserService {
    pub async fn get(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Usernames are matched case-insensitively.
    pub async fn get_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, AppError> {
        let user: Option<User> =
            sqlx::query_as("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
                .bind(username)
                .fetch_optional(pool)
                .await?;

        Ok(user)
    }
}
