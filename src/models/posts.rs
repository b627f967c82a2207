use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{double_option, groups::GroupRef, not_blank};

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl Post {
    /// First 15 characters of the text.
    pub fn preview(&self) -> String {
        self.text.chars().take(15).collect()
    }
}

/// A post joined with the columns every feed shows.
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct PostRow {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub image: Option<String>,
    pub comments_count: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: String,
    pub group: Option<GroupRef>,
    pub image: Option<String>,
    pub comments_count: i64,
}

impl From<PostRow> for PostView {
    fn from(row: PostRow) -> Self {
        let group = match (row.group_id, row.group_slug, row.group_title) {
            (Some(id), Some(slug), Some(title)) => Some(GroupRef { id, slug, title }),
            _ => None,
        };

        Self {
            id: row.id,
            text: row.text,
            pub_date: row.pub_date,
            author: row.author_username,
            group,
            image: row.image,
            comments_count: row.comments_count,
        }
    }
}

/// Fields accepted from the create/edit form, after multipart parsing.
#[derive(Debug, Default, Validate)]
pub struct PostForm {
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    pub group: Option<i64>,
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostDto {
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    pub group: Option<i64>,
    pub image: Option<String>,
}

/// Partial update body. A `group` key with `null` detaches the post, an
/// absent key leaves it alone.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostDto {
    #[validate(custom(function = "not_blank"))]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub group: Option<Option<i64>>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PostResponseDto {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub image: Option<String>,
    pub group: Option<i64>,
    pub pub_date: DateTime<Utc>,
}

impl From<PostView> for PostResponseDto {
    fn from(view: PostView) -> Self {
        Self {
            id: view.id,
            text: view.text,
            author: view.author,
            image: view.image,
            group: view.group.map(|g| g.id),
            pub_date: view.pub_date,
        }
    }
}

/// Changes applied to a stored post. `None` keeps the column as is.
#[derive(Debug, Default, Clone)]
pub struct PostChanges {
    pub text: Option<String>,
    pub group_id: Option<Option<i64>>,
    pub image: Option<String>,
}
