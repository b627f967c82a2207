use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::not_blank;

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Uuid,
    pub text: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq, Eq)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub post: i64,
    pub author_id: Uuid,
    pub author: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub text: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentDto {
    #[validate(custom(function = "not_blank"))]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CommentResponseDto {
    pub id: i64,
    pub author: String,
    pub post: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl From<CommentWithAuthor> for CommentResponseDto {
    fn from(comment: CommentWithAuthor) -> Self {
        Self {
            id: comment.id,
            author: comment.author,
            post: comment.post,
            text: comment.text,
            created: comment.created,
        }
    }
}
