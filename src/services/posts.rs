use std::sync::Arc;

use tracing::{info, instrument};
use validator::{ValidationError, ValidationErrors};

use crate::{
    models::{
        comments::CommentWithAuthor,
        posts::{Post, PostChanges, PostView},
        users::User,
    },
    repositories::{CommentRepository, GroupRepository, PostFilter, PostRepository},
    utils::media::MediaStorage,
    Error, Result,
};

use super::permissions::{check_author, Access, Action};

/// A post about to be written.
#[derive(Debug, Default)]
pub struct NewPost {
    pub text: String,
    pub group: Option<i64>,
    pub image: Option<Vec<u8>>,
}

/// `None` fields are left untouched, `group: Some(None)` detaches the post.
#[derive(Debug, Default)]
pub struct PostEdit {
    pub text: Option<String>,
    pub group: Option<Option<i64>>,
    pub image: Option<Vec<u8>>,
}

/// Field error for a `group` that names no existing group.
pub fn invalid_group() -> Error {
    let mut errors = ValidationErrors::new();
    errors.add(
        "group",
        ValidationError::new("invalid_choice").with_message(
            "Select a valid choice. That choice is not one of the available choices.".into(),
        ),
    );
    Error::Validation(errors)
}

#[derive(Clone)]
pub struct PostsService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    groups: Arc<dyn GroupRepository>,
    media: MediaStorage,
}

impl PostsService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        groups: Arc<dyn GroupRepository>,
        media: MediaStorage,
    ) -> Self {
        Self {
            posts,
            comments,
            groups,
            media,
        }
    }

    pub async fn get_post(&self, post_id: i64) -> Result<PostView> {
        self.posts
            .get_post(post_id)
            .await?
            .map(PostView::from)
            .ok_or(Error::NotFound)
    }

    pub async fn list_posts(&self) -> Result<Vec<PostView>> {
        let count = self.posts.count_posts(PostFilter::All).await?;
        let rows = self.posts.list_posts(PostFilter::All, 0, count).await?;
        Ok(rows.into_iter().map(PostView::from).collect())
    }

    /// Evaluates the ownership rule without touching the post.
    pub async fn access(&self, actor: &User, post_id: i64, action: Action) -> Result<Access> {
        let post = self.posts.get_post(post_id).await?.ok_or(Error::NotFound)?;
        Ok(check_author(Some(actor.id), post.author_id, action))
    }

    async fn ensure_group(&self, group_id: Option<i64>) -> Result<()> {
        let Some(group_id) = group_id else {
            return Ok(());
        };
        if self.groups.get_group_by_id(group_id).await?.is_some() {
            return Ok(());
        }
        Err(invalid_group())
    }

    async fn store_image(&self, image: Option<Vec<u8>>) -> Result<Option<String>> {
        match image {
            Some(bytes) if !bytes.is_empty() => Ok(Some(self.media.save_post_image(bytes).await?)),
            _ => Ok(None),
        }
    }

    /// Drops a freshly stored image when the row that should point at it was
    /// never written.
    async fn discard_image<T>(&self, image: Option<&str>, result: Result<T>) -> Result<T> {
        if result.is_err() {
            if let Some(name) = image {
                self.media.remove(name).await;
            }
        }
        result
    }

    #[instrument(skip(self, author, post), fields(author = %author.username))]
    pub async fn create_post(&self, author: &User, post: NewPost) -> Result<Post> {
        self.ensure_group(post.group).await?;
        let image = self.store_image(post.image).await?;

        let created = self
            .posts
            .create_post(author.id, &post.text, post.group, image.as_deref())
            .await;
        let post = self.discard_image(image.as_deref(), created).await?;

        info!(post_id = post.id, preview = %post.preview(), "Created post");
        Ok(post)
    }

    #[instrument(skip(self, actor, edit), fields(actor = %actor.username))]
    pub async fn update_post(&self, actor: &User, post_id: i64, edit: PostEdit) -> Result<Post> {
        self.access(actor, post_id, Action::Update)
            .await?
            .into_result()?;

        self.ensure_group(edit.group.flatten()).await?;
        let image = self.store_image(edit.image).await?;

        let updated = self
            .posts
            .update_post(
                post_id,
                PostChanges {
                    text: edit.text,
                    group_id: edit.group,
                    image: image.clone(),
                },
            )
            .await;
        let post = self.discard_image(image.as_deref(), updated).await?;

        info!(post_id, preview = %post.preview(), "Updated post");
        Ok(post)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn delete_post(&self, actor: &User, post_id: i64) -> Result<()> {
        self.access(actor, post_id, Action::Destroy)
            .await?
            .into_result()?;

        self.posts.delete_post(post_id).await?;
        info!(post_id, "Deleted post");
        Ok(())
    }

    pub async fn get_comments(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
        self.get_post(post_id).await?;
        self.comments.get_comments_for_post(post_id).await
    }

    pub async fn get_comment(&self, post_id: i64, comment_id: i64) -> Result<CommentWithAuthor> {
        self.get_post(post_id).await?;
        self.comments
            .get_comment(post_id, comment_id)
            .await?
            .ok_or(Error::NotFound)
    }

    pub async fn add_comment(
        &self,
        author: &User,
        post_id: i64,
        text: &str,
    ) -> Result<CommentWithAuthor> {
        self.get_post(post_id).await?;
        let comment = self
            .comments
            .create_comment(post_id, author.id, text)
            .await?;

        info!(post_id, comment_id = comment.id, author = %author.username, "Added comment");
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        actor: &User,
        post_id: i64,
        comment_id: i64,
        text: Option<&str>,
    ) -> Result<CommentWithAuthor> {
        let comment = self.get_comment(post_id, comment_id).await?;
        check_author(Some(actor.id), comment.author_id, Action::Update).into_result()?;

        self.comments.update_comment(comment_id, text).await
    }

    pub async fn delete_comment(&self, actor: &User, post_id: i64, comment_id: i64) -> Result<()> {
        let comment = self.get_comment(post_id, comment_id).await?;
        check_author(Some(actor.id), comment.author_id, Action::Destroy).into_result()?;

        self.comments.delete_comment(comment_id).await
    }
}
