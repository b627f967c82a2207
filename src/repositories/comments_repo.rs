use async_trait::async_trait;
use uuid::Uuid;

use crate::{models::comments::CommentWithAuthor, Result};

use super::PostgresRepo;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Oldest first.
    async fn get_comments_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>>;
    async fn get_comment(&self, post_id: i64, comment_id: i64)
        -> Result<Option<CommentWithAuthor>>;
    async fn create_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> Result<CommentWithAuthor>;
    async fn update_comment(&self, comment_id: i64, text: Option<&str>)
        -> Result<CommentWithAuthor>;
    async fn delete_comment(&self, comment_id: i64) -> Result<()>;
}

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id AS post, c.author_id, u.username AS author, c.text, c.created
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

#[async_trait]
impl CommentRepository for PostgresRepo {
    async fn get_comments_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(&format!(
            "{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created, c.id"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn get_comment(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<CommentWithAuthor>> {
        let comment = sqlx::query_as::<_, CommentWithAuthor>(&format!(
            "{COMMENT_SELECT} WHERE c.post_id = $1 AND c.id = $2"
        ))
        .bind(post_id)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> Result<CommentWithAuthor> {
        let comment = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, author_id, text, created)
                VALUES ($1, $2, $3, NOW())
                RETURNING id, post_id, author_id, text, created
            )
            SELECT i.id, i.post_id AS post, i.author_id, u.username AS author, i.text, i.created
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        text: Option<&str>,
    ) -> Result<CommentWithAuthor> {
        let comment = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            WITH updated AS (
                UPDATE comments
                SET text = COALESCE($2, text)
                WHERE id = $1
                RETURNING id, post_id, author_id, text, created
            )
            SELECT d.id, d.post_id AS post, d.author_id, u.username AS author, d.text, d.created
            FROM updated d
            JOIN users u ON u.id = d.author_id
            "#,
        )
        .bind(comment_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
