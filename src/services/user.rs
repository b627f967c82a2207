use std::sync::Arc;

use uuid::Uuid;

use crate::{
    models::users::{PasswordChangeForm, User},
    repositories::UserRepository,
    Error, Result,
};

use super::auth::{hash_password, verify_password};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        let user = self.repo.get_user(Some(user_id), None).await?;
        user.ok_or(Error::NotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        let user = self.repo.get_user(None, Some(username)).await?;
        user.ok_or(Error::NotFound)
    }

    pub async fn change_password(&self, user: &User, form: PasswordChangeForm) -> Result<()> {
        let user = self.get_user(user.id).await?;

        if !verify_password(&form.old_password, &user.password)? {
            return Err(Error::BadRequest(
                "Your old password was entered incorrectly.".to_string(),
            ));
        }

        let hash = hash_password(&form.new_password1)?;
        self.repo.update_password(user.id, &hash).await
    }

    /// Removes the account together with its posts, comments and follows.
    pub async fn delete_user(&self, username: &str) -> Result<()> {
        let user = self.get_by_username(username).await?;
        self.repo.delete_user(user.id).await?;
        tracing::info!(username, "Deleted user");
        Ok(())
    }
}
