use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    models::posts::{Post, PostChanges, PostRow},
    Result,
};

use super::PostgresRepo;

/// Which posts a feed is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(Uuid),
    FollowedBy(Uuid),
}

impl PostFilter {
    fn binds(self) -> (Option<i64>, Option<Uuid>, Option<Uuid>) {
        match self {
            Self::All => (None, None, None),
            Self::Group(group_id) => (Some(group_id), None, None),
            Self::Author(author_id) => (None, Some(author_id), None),
            Self::FollowedBy(user_id) => (None, None, Some(user_id)),
        }
    }
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn count_posts(&self, filter: PostFilter) -> Result<i64>;

    /// Newest first.
    async fn list_posts(&self, filter: PostFilter, offset: i64, limit: i64)
        -> Result<Vec<PostRow>>;

    async fn get_post(&self, post_id: i64) -> Result<Option<PostRow>>;
    async fn create_post(
        &self,
        author_id: Uuid,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> Result<Post>;
    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Post>;
    async fn delete_post(&self, post_id: i64) -> Result<()>;
}

const POST_ROW_SELECT: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.author_id, u.username AS author_username,
           p.group_id, g.slug AS group_slug, g.title AS group_title, p.image,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

const POST_FILTER: &str = r#"
    WHERE ($1::BIGINT IS NULL OR p.group_id = $1)
      AND ($2::UUID IS NULL OR p.author_id = $2)
      AND ($3::UUID IS NULL OR p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = $3))
"#;

#[async_trait]
impl PostRepository for PostgresRepo {
    #[instrument(skip(self))]
    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let (group_id, author_id, follower_id) = filter.binds();

        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM posts p {POST_FILTER}"))
                .bind(group_id)
                .bind(author_id)
                .bind(follower_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn list_posts(
        &self,
        filter: PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostRow>> {
        let (group_id, author_id, follower_id) = filter.binds();

        let posts = sqlx::query_as::<_, PostRow>(&format!(
            "{POST_ROW_SELECT} {POST_FILTER} ORDER BY p.pub_date DESC, p.id DESC OFFSET $4 LIMIT $5"
        ))
        .bind(group_id)
        .bind(author_id)
        .bind(follower_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn get_post(&self, post_id: i64) -> Result<Option<PostRow>> {
        let post = sqlx::query_as::<_, PostRow>(&format!("{POST_ROW_SELECT} WHERE p.id = $1"))
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn create_post(
        &self,
        author_id: Uuid,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (text, author_id, group_id, image, pub_date)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, text, pub_date, author_id, group_id, image
            "#,
        )
        .bind(text)
        .bind(author_id)
        .bind(group_id)
        .bind(image)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Post> {
        let (set_group, group_id) = match changes.group_id {
            Some(group_id) => (true, group_id),
            None => (false, None),
        };

        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET text = COALESCE($2, text),
                group_id = CASE WHEN $3 THEN $4 ELSE group_id END,
                image = COALESCE($5, image)
            WHERE id = $1
            RETURNING id, text, pub_date, author_id, group_id, image
            "#,
        )
        .bind(post_id)
        .bind(changes.text)
        .bind(set_group)
        .bind(group_id)
        .bind(changes.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn delete_post(&self, post_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
