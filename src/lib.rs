use std::{sync::Arc, time::Duration};

use config::Config;
use repositories::Repository;
use services::{
    auth::AuthService, cache::FeedCache, feed::FeedService, follow::FollowService,
    groups::GroupService, posts::PostsService, user::UserService,
};
use utils::media::MediaStorage;

pub use self::errors::{Error, Result};

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth_service: AuthService,
    pub users_service: UserService,
    pub groups_service: GroupService,
    pub posts_service: PostsService,
    pub feed_service: FeedService,
    pub follow_service: FollowService,
}

impl AppState {
    /// Wires every service onto one store.
    pub fn new<R: Repository + 'static>(repo: Arc<R>, config: Config) -> Self {
        let cache = FeedCache::new(Duration::from_secs(config.index_cache_seconds));
        let media = MediaStorage::new(&config.media_root);

        Self {
            auth_service: AuthService::new(
                repo.clone(),
                config.jwt_secret.clone(),
                config.jwt_maxage,
            ),
            users_service: UserService::new(repo.clone()),
            groups_service: GroupService::new(repo.clone()),
            posts_service: PostsService::new(repo.clone(), repo.clone(), repo.clone(), media),
            feed_service: FeedService::new(
                repo.clone(),
                repo.clone(),
                repo.clone(),
                repo.clone(),
                repo.clone(),
                cache,
                config.objects_per_page,
            ),
            follow_service: FollowService::new(repo.clone(), repo),
            config,
        }
    }
}
