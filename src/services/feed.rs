use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    models::{
        comments::CommentWithAuthor,
        groups::Group,
        posts::PostView,
        users::{FilterUserDto, User},
    },
    repositories::{
        CommentRepository, FollowRepository, GroupRepository, PostFilter, PostRepository,
        UserRepository,
    },
    utils::pagination::{Page, PageWindow, Paginator},
    Error, Result,
};

use super::cache::FeedCache;

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct GroupPage {
    pub group: Group,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub author: FilterUserDto,
    pub posts_count: i64,
    pub following: bool,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct FollowPage {
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailPage {
    pub post: PostView,
    pub title: String,
    pub count: i64,
    pub comments: Vec<CommentWithAuthor>,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
    comments: Arc<dyn CommentRepository>,
    cache: FeedCache,
    per_page: usize,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        follows: Arc<dyn FollowRepository>,
        comments: Arc<dyn CommentRepository>,
        cache: FeedCache,
        per_page: usize,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
            comments,
            cache,
            per_page,
        }
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    async fn resolve(
        &self,
        filter: PostFilter,
        page: Option<&str>,
    ) -> Result<(Paginator, PageWindow)> {
        let count = self.posts.count_posts(filter).await?;
        let paginator = Paginator::new(count.max(0) as usize, self.per_page);
        Ok((paginator, paginator.window(page)))
    }

    async fn fetch(
        &self,
        filter: PostFilter,
        paginator: Paginator,
        window: PageWindow,
    ) -> Result<Page<PostView>> {
        let rows = self
            .posts
            .list_posts(filter, window.offset as i64, window.limit as i64)
            .await?;

        Ok(paginator.page(window, rows).map(PostView::from))
    }

    async fn paginate(&self, filter: PostFilter, page: Option<&str>) -> Result<Page<PostView>> {
        let (paginator, window) = self.resolve(filter, page).await?;
        self.fetch(filter, paginator, window).await
    }

    /// Home feed, served from the cache while the entry is fresh. Returns the
    /// rendered JSON body. Entries are keyed by the resolved page number, so
    /// any `?page=` value maps onto one of the existing pages.
    #[instrument(skip(self))]
    pub async fn index(&self, page: Option<&str>) -> Result<String> {
        let (paginator, window) = self.resolve(PostFilter::All, page).await?;
        let key = format!("index_page:{}", window.number);
        if let Some(rendered) = self.cache.get(&key) {
            return Ok(rendered);
        }

        let page_obj = self.fetch(PostFilter::All, paginator, window).await?;
        let rendered = serde_json::to_string(&IndexPage { page_obj }).map_err(|e| {
            tracing::error!("Failed to render index page: {:?}", e);
            Error::InternalServerError
        })?;

        debug!("Caching {}", key);
        self.cache.insert(key, rendered.clone());
        Ok(rendered)
    }

    #[instrument(skip(self))]
    pub async fn group_posts(&self, slug: &str, page: Option<&str>) -> Result<GroupPage> {
        let group = self
            .groups
            .get_group_by_slug(slug)
            .await?
            .ok_or(Error::NotFound)?;
        let page_obj = self.paginate(PostFilter::Group(group.id), page).await?;

        Ok(GroupPage { group, page_obj })
    }

    #[instrument(skip(self, viewer))]
    pub async fn profile(
        &self,
        username: &str,
        page: Option<&str>,
        viewer: Option<&User>,
    ) -> Result<ProfilePage> {
        let author = self
            .users
            .get_user(None, Some(username))
            .await?
            .ok_or(Error::NotFound)?;
        let page_obj = self.paginate(PostFilter::Author(author.id), page).await?;

        let following = match viewer {
            Some(viewer) if viewer.id != author.id => {
                self.follows.is_following(viewer.id, author.id).await?
            }
            _ => false,
        };

        Ok(ProfilePage {
            author: FilterUserDto::filter_user(&author),
            posts_count: page_obj.count as i64,
            following,
            page_obj,
        })
    }

    #[instrument(skip(self, user), fields(user = %user.username))]
    pub async fn follow_index(&self, user: &User, page: Option<&str>) -> Result<FollowPage> {
        let page_obj = self.paginate(PostFilter::FollowedBy(user.id), page).await?;
        Ok(FollowPage { page_obj })
    }

    #[instrument(skip(self))]
    pub async fn post_detail(&self, post_id: i64) -> Result<PostDetailPage> {
        let row = self.posts.get_post(post_id).await?.ok_or(Error::NotFound)?;
        let count = self.posts.count_posts(PostFilter::Author(row.author_id)).await?;
        let comments = self.comments.get_comments_for_post(post_id).await?;
        let post = PostView::from(row);

        Ok(PostDetailPage {
            title: post.text.chars().take(30).collect(),
            post,
            count,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        models::{
            groups::CreateGroupDto,
            users::{NewUser, UserRole},
        },
        repositories::MemoryRepo,
    };

    fn service(repo: &Arc<MemoryRepo>, per_page: usize) -> FeedService {
        FeedService::new(
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            FeedCache::new(Duration::from_secs(20)),
            per_page,
        )
    }

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
    async fn group_feed_only_holds_group_posts() {
        let repo = Arc::new(MemoryRepo::new());
        let feed = service(&repo, 10);
        let author = user(&repo, "author").await;
        let group = repo
            .create_group(CreateGroupDto {
                title: "Cats".to_string(),
                slug: "cats".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        repo.create_post(author.id, "in", Some(group.id), None)
            .await
            .unwrap();
        repo.create_post(author.id, "out", None, None).await.unwrap();

        let page = feed.group_posts("cats", None).await.unwrap();

        assert_eq!(page.group, group);
        assert_eq!(page.page_obj.len(), 1);
        assert_eq!(page.page_obj.objects[0].text, "in");
        assert!(matches!(
            feed.group_posts("dogs", None).await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn feeds_are_newest_first() {
        let repo = Arc::new(MemoryRepo::new());
        let feed = service(&repo, 10);
        let author = user(&repo, "author").await;
        for text in ["first", "second", "third"] {
            repo.create_post(author.id, text, None, None).await.unwrap();
        }

        let page = feed.profile("author", None, None).await.unwrap();
        let texts: Vec<_> = page.page_obj.objects.iter().map(|p| p.text.as_str()).collect();

        assert_eq!(texts, ["third", "second", "first"]);
        assert_eq!(page.posts_count, 3);
    }

    #[tokio::test]
    async fn follow_feed_holds_only_followed_authors() {
        let repo = Arc::new(MemoryRepo::new());
        let feed = service(&repo, 10);
        let author = user(&repo, "author").await;
        let reader = user(&repo, "reader").await;
        repo.create_post(author.id, "by author", None, None)
            .await
            .unwrap();
        repo.create_post(reader.id, "by reader", None, None)
            .await
            .unwrap();
        repo.follow(reader.id, author.id).await.unwrap();

        let reader_feed = feed.follow_index(&reader, None).await.unwrap();
        let author_feed = feed.follow_index(&author, None).await.unwrap();

        assert_eq!(reader_feed.page_obj.len(), 1);
        assert_eq!(reader_feed.page_obj.objects[0].text, "by author");
        assert!(author_feed.page_obj.is_empty());

        let profile = feed.profile("author", None, Some(&reader)).await.unwrap();
        assert!(profile.following);
    }

    #[tokio::test]
    async fn index_serves_cached_render_until_cleared() {
        let repo = Arc::new(MemoryRepo::new());
        let feed = service(&repo, 10);
        let author = user(&repo, "author").await;
        let post = repo
            .create_post(author.id, "soon gone", None, None)
            .await
            .unwrap();

        let before = feed.index(None).await.unwrap();
        repo.delete_post(post.id).await.unwrap();

        assert_eq!(feed.index(None).await.unwrap(), before);
        feed.cache().clear();
        assert!(!feed.index(None).await.unwrap().contains("soon gone"));
    }

    #[tokio::test(start_paused = true)]
    async fn junk_page_values_do_not_grow_the_cache() {
        let repo = Arc::new(MemoryRepo::new());
        let feed = service(&repo, 10);
        let author = user(&repo, "author").await;
        repo.create_post(author.id, "only post", None, None)
            .await
            .unwrap();

        for i in 0..1000 {
            feed.index(Some(&format!("junk{i}"))).await.unwrap();
        }
        assert_eq!(feed.cache().len(), 1);

        tokio::time::advance(Duration::from_secs(3600)).await;
        feed.index(Some("1")).await.unwrap();

        assert!(feed.cache().len() <= 2);
    }

    #[tokio::test]
    async fn detail_title_is_first_thirty_characters() {
        let repo = Arc::new(MemoryRepo::new());
        let feed = service(&repo, 10);
        let author = user(&repo, "author").await;
        let text = "a".repeat(45);
        let post = repo.create_post(author.id, &text, None, None).await.unwrap();

        let detail = feed.post_detail(post.id).await.unwrap();

        assert_eq!(detail.title.len(), 30);
        assert_eq!(detail.count, 1);
    }
}
