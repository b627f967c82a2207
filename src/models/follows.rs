use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directed edge: `user_id` receives the posts of `author_id`.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq, Eq)]
pub struct Follow {
    pub id: i64,
    pub user_id: Uuid,
    pub author_id: Uuid,
}
