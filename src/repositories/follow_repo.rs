use async_trait::async_trait;
use uuid::Uuid;

use crate::Result;

use super::PostgresRepo;

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Returns `false` when the edge already existed.
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;

    /// Returns the number of removed edges, zero is not an error.
    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Result<u64>;

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool>;
}

#[async_trait]
impl FollowRepository for PostgresRepo {
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
