use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    models::users::{NewUser, User},
    Result,
};

use super::PostgresRepo;

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password, role, created_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Looks a user up by exactly one of id or username.
    async fn get_user(&self, user_id: Option<Uuid>, username: Option<&str>)
        -> Result<Option<User>>;

    async fn update_password(&self, user_id: Uuid, new_password: &str) -> Result<()>;
    async fn delete_user(&self, user_id: Uuid) -> Result<()>;
}

#[async_trait]
impl UserRepository for PostgresRepo {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, password, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::now_v7())
            .bind(user.username)
            .bind(user.email)
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
    ) -> Result<Option<User>> {
        let user = match (user_id, username) {
            (Some(user_id), None) => {
                tracing::debug!("Fetching user by ID: {}", user_id);
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
                ))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
            }
            (None, Some(username)) => {
                tracing::debug!("Fetching user by username: {}", username);
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
                ))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?
            }
            _ => {
                tracing::warn!("Invalid combination of parameters");
                return Ok(None);
            }
        };

        tracing::debug!(user_found = user.is_some(), "User query completed");

        Ok(user)
    }

    async fn update_password(&self, user_id: Uuid, new_password: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(new_password)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
