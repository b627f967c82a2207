use async_trait::async_trait;

use crate::{
    models::groups::{CreateGroupDto, Group},
    Result,
};

use super::PostgresRepo;

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<Group>>;
    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<Group>>;
    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;
    async fn create_group(&self, group: CreateGroupDto) -> Result<Group>;
    async fn update_group(
        &self,
        slug: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Group>;

    /// Removes the group together with its posts.
    async fn delete_group(&self, slug: &str) -> Result<()>;
}

#[async_trait]
impl GroupRepository for PostgresRepo {
    async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn create_group(&self, group: CreateGroupDto) -> Result<Group> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO post_groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(group.title)
        .bind(group.slug)
        .bind(group.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    async fn update_group(
        &self,
        slug: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Group> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            UPDATE post_groups
            SET title = COALESCE($2, title),
                description = COALESCE($3, description)
            WHERE slug = $1
            RETURNING id, title, slug, description
            "#,
        )
        .bind(slug)
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    async fn delete_group(&self, slug: &str) -> Result<()> {
        sqlx::query("DELETE FROM post_groups WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
