use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    models::users::User,
    repositories::{FollowRepository, UserRepository},
    Error, Result,
};

#[derive(Clone)]
pub struct FollowService {
    follows: Arc<dyn FollowRepository>,
    users: Arc<dyn UserRepository>,
}

impl FollowService {
    pub fn new(follows: Arc<dyn FollowRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { follows, users }
    }

    async fn author(&self, username: &str) -> Result<User> {
        self.users
            .get_user(None, Some(username))
            .await?
            .ok_or(Error::NotFound)
    }

    /// Following yourself or someone already followed changes nothing.
    pub async fn follow(&self, user: &User, username: &str) -> Result<()> {
        let author = self.author(username).await?;
        if author.id == user.id {
            debug!(user = %user.username, "Ignoring self-follow");
            return Ok(());
        }

        if self.follows.follow(user.id, author.id).await? {
            info!(user = %user.username, author = %author.username, "Followed author");
        }
        Ok(())
    }

    pub async fn unfollow(&self, user: &User, username: &str) -> Result<()> {
        let author = self.author(username).await?;
        let removed = self.follows.unfollow(user.id, author.id).await?;
        debug!(user = %user.username, author = %author.username, removed, "Unfollowed author");
        Ok(())
    }
}
