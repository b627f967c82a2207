use std::sync::Arc;

use tracing::info;

use crate::{
    models::groups::{CreateGroupDto, Group, UpdateGroupDto},
    repositories::GroupRepository,
    Error, Result,
};

#[derive(Clone)]
pub struct GroupService {
    repo: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(repo: Arc<dyn GroupRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        self.repo.list_groups().await
    }

    pub async fn get_group(&self, group_id: i64) -> Result<Group> {
        self.repo
            .get_group_by_id(group_id)
            .await?
            .ok_or(Error::NotFound)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Group> {
        self.repo
            .get_group_by_slug(slug)
            .await?
            .ok_or(Error::NotFound)
    }

    pub async fn create_group(&self, group: CreateGroupDto) -> Result<Group> {
        let group = self.repo.create_group(group).await?;
        info!(slug = %group.slug, "Created group");
        Ok(group)
    }

    pub async fn update_group(&self, slug: &str, changes: UpdateGroupDto) -> Result<Group> {
        self.get_by_slug(slug).await?;
        self.repo
            .update_group(slug, changes.title.as_deref(), changes.description.as_deref())
            .await
    }

    pub async fn delete_group(&self, slug: &str) -> Result<()> {
        self.get_by_slug(slug).await?;
        self.repo.delete_group(slug).await?;
        info!(slug = %slug, "Deleted group with its posts");
        Ok(())
    }
}
