//! In-process store with the same constraints as the SQL schema: unique
//! usernames and slugs, unique follow edges, no self-follow and cascading
//! deletes. Backs the router tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    models::{
        comments::{Comment, CommentWithAuthor},
        follows::Follow,
        groups::{CreateGroupDto, Group},
        posts::{Post, PostChanges, PostRow},
        users::{NewUser, User},
    },
    Error, Result,
};

use super::{
    CommentRepository, FollowRepository, GroupRepository, PostFilter, PostRepository,
    UserRepository,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn username(&self, user_id: Uuid) -> String {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id),
        }
    }

    fn row(&self, post: &Post) -> PostRow {
        let group = post
            .group_id
            .and_then(|id| self.groups.iter().find(|g| g.id == id));

        PostRow {
            id: post.id,
            text: post.text.clone(),
            pub_date: post.pub_date,
            author_id: post.author_id,
            author_username: self.username(post.author_id),
            group_id: group.map(|g| g.id),
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
            image: post.image.clone(),
            comments_count: self.comments.iter().filter(|c| c.post_id == post.id).count() as i64,
        }
    }

    fn comment_row(&self, comment: &Comment) -> CommentWithAuthor {
        CommentWithAuthor {
            id: comment.id,
            post: comment.post_id,
            author_id: comment.author_id,
            author: self.username(comment.author_id),
            text: comment.text.clone(),
            created: comment.created,
        }
    }

    fn remove_posts(&mut self, doomed: impl Fn(&Post) -> bool) {
        let removed: Vec<i64> = self
            .posts
            .iter()
            .filter(|p| doomed(p))
            .map(|p| p.id)
            .collect();
        self.posts.retain(|p| !removed.contains(&p.id));
        self.comments.retain(|c| !removed.contains(&c.post_id));
    }
}

#[derive(Default)]
pub struct MemoryRepo {
    tables: RwLock<Tables>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate(what: &str) -> Error {
    Error::BadRequest(format!("{} with this value already exists", what))
}

#[async_trait]
impl UserRepository for MemoryRepo {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(duplicate("User"));
        }

        let user = User {
            id: Uuid::now_v7(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            password: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
    ) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        let user = match (user_id, username) {
            (Some(id), None) => tables.users.iter().find(|u| u.id == id),
            (None, Some(name)) => tables.users.iter().find(|u| u.username == name),
            _ => None,
        };
        Ok(user.cloned())
    }

    async fn update_password(&self, user_id: Uuid, new_password: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) {
            user.password = new_password.to_string();
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.users.retain(|u| u.id != user_id);
        tables.remove_posts(|p| p.author_id == user_id);
        tables.comments.retain(|c| c.author_id != user_id);
        tables
            .follows
            .retain(|f| f.user_id != user_id && f.author_id != user_id);
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for MemoryRepo {
    async fn list_groups(&self) -> Result<Vec<Group>> {
        let mut groups = self.tables.read().await.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.id == group_id).cloned())
    }

    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn create_group(&self, group: CreateGroupDto) -> Result<Group> {
        let mut tables = self.tables.write().await;
        if tables.groups.iter().any(|g| g.slug == group.slug) {
            return Err(duplicate("Group"));
        }

        let group = Group {
            id: tables.next_id(),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn update_group(
        &self,
        slug: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Group> {
        let mut tables = self.tables.write().await;
        let group = tables
            .groups
            .iter_mut()
            .find(|g| g.slug == slug)
            .ok_or(Error::NotFound)?;

        if let Some(title) = title {
            group.title = title.to_string();
        }
        if let Some(description) = description {
            group.description = description.to_string();
        }
        Ok(group.clone())
    }

    async fn delete_group(&self, slug: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let Some(group_id) = tables.groups.iter().find(|g| g.slug == slug).map(|g| g.id) else {
            return Ok(());
        };
        tables.groups.retain(|g| g.id != group_id);
        tables.remove_posts(|p| p.group_id == Some(group_id));
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryRepo {
    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().filter(|p| tables.matches(p, filter)).count() as i64)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostRow>> {
        let tables = self.tables.read().await;
        let mut posts: Vec<&Post> = tables
            .posts
            .iter()
            .filter(|p| tables.matches(p, filter))
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|p| tables.row(p))
            .collect())
    }

    async fn get_post(&self, post_id: i64) -> Result<Option<PostRow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| tables.row(p)))
    }

    async fn create_post(
        &self,
        author_id: Uuid,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == author_id) {
            return Err(Error::BadRequest("Unknown author".to_string()));
        }
        if let Some(group_id) = group_id {
            if !tables.groups.iter().any(|g| g.id == group_id) {
                return Err(Error::BadRequest("Unknown group".to_string()));
            }
        }

        let post = Post {
            id: tables.next_id(),
            text: text.to_string(),
            pub_date: Utc::now(),
            author_id,
            group_id,
            image: image.map(str::to_string),
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Post> {
        let mut tables = self.tables.write().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(Error::NotFound)?;

        if let Some(text) = changes.text {
            post.text = text;
        }
        if let Some(group_id) = changes.group_id {
            post.group_id = group_id;
        }
        if let Some(image) = changes.image {
            post.image = Some(image);
        }
        Ok(post.clone())
    }

    async fn delete_post(&self, post_id: i64) -> Result<()> {
        self.tables
            .write()
            .await
            .remove_posts(|p| p.id == post_id);
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for MemoryRepo {
    async fn get_comments_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<&Comment> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments.into_iter().map(|c| tables.comment_row(c)).collect())
    }

    async fn get_comment(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<CommentWithAuthor>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .find(|c| c.post_id == post_id && c.id == comment_id)
            .map(|c| tables.comment_row(c)))
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> Result<CommentWithAuthor> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == post_id) {
            return Err(Error::NotFound);
        }

        let comment = Comment {
            id: tables.next_id(),
            post_id,
            author_id,
            text: text.to_string(),
            created: Utc::now(),
        };
        let row = tables.comment_row(&comment);
        tables.comments.push(comment);
        Ok(row)
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        text: Option<&str>,
    ) -> Result<CommentWithAuthor> {
        let mut tables = self.tables.write().await;
        let comment = tables
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or(Error::NotFound)?;

        if let Some(text) = text {
            comment.text = text.to_string();
        }
        let comment = comment.clone();
        Ok(tables.comment_row(&comment))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<()> {
        self.tables
            .write()
            .await
            .comments
            .retain(|c| c.id != comment_id);
        Ok(())
    }
}

#[async_trait]
impl FollowRepository for MemoryRepo {
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        if user_id == author_id {
            return Err(Error::BadRequest("Users cannot follow themselves".to_string()));
        }

        let mut tables = self.tables.write().await;
        if tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(false);
        }

        let id = tables.next_id();
        tables.follows.push(Follow {
            id,
            user_id,
            author_id,
        });
        Ok(true)
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok((before - tables.follows.len()) as u64)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::UserRole;

    async fn user(repo: &MemoryRepo, username: &str) -> User {
        repo.create_user(NewUser {
            username: username.to_string(),
            email: None,
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "hash".to_string(),
            role: UserRole::User,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn deleting_an_author_cascades_to_posts_and_comments() {
        let repo = MemoryRepo::new();
        let author = user(&repo, "author").await;
        let reader = user(&repo, "reader").await;
        let post = repo.create_post(author.id, "text", None, None).await.unwrap();
        repo.create_comment(post.id, reader.id, "nice").await.unwrap();

        repo.delete_user(author.id).await.unwrap();

        assert_eq!(repo.count_posts(PostFilter::All).await.unwrap(), 0);
        assert_eq!(repo.get_comments_for_post(post.id).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn deleting_a_group_cascades_to_its_posts() {
        let repo = MemoryRepo::new();
        let author = user(&repo, "author").await;
        let group = repo
            .create_group(CreateGroupDto {
                title: "Cats".to_string(),
                slug: "cats".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        repo.create_post(author.id, "in group", Some(group.id), None)
            .await
            .unwrap();
        repo.create_post(author.id, "loose", None, None).await.unwrap();

        repo.delete_group("cats").await.unwrap();

        let left = repo.list_posts(PostFilter::All, 0, 10).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].text, "loose");
    }

    #[tokio::test]
    async fn follow_edges_are_unique() {
        let repo = MemoryRepo::new();
        let a = user(&repo, "a").await;
        let b = user(&repo, "b").await;

        assert!(repo.follow(a.id, b.id).await.unwrap());
        assert!(!repo.follow(a.id, b.id).await.unwrap());
        assert_eq!(repo.unfollow(a.id, b.id).await.unwrap(), 1);
        assert_eq!(repo.unfollow(a.id, b.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let repo = MemoryRepo::new();
        user(&repo, "leo").await;
        let err = repo
            .create_user(NewUser {
                username: "leo".to_string(),
                email: None,
                first_name: String::new(),
                last_name: String::new(),
                password_hash: "hash".to_string(),
                role: UserRole::User,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}
