use sqlx::PgPool;

pub mod comments_repo;
pub mod follow_repo;
pub mod group_repo;
pub mod memory;
pub mod posts_repo;
pub mod user_repo;

pub use comments_repo::CommentRepository;
pub use follow_repo::FollowRepository;
pub use group_repo::GroupRepository;
pub use memory::MemoryRepo;
pub use posts_repo::{PostFilter, PostRepository};
pub use user_repo::UserRepository;

/// Every repository trait, so one store can back the whole application.
pub trait Repository:
    UserRepository + GroupRepository + PostRepository + CommentRepository + FollowRepository
{
}

impl<T> Repository for T where
    T: UserRepository + GroupRepository + PostRepository + CommentRepository + FollowRepository
{
}

#[derive(Clone)]
pub struct PostgresRepo {
    pool: PgPool,
}

impl PostgresRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
