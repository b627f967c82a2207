use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if slug.chars().all(allowed) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("slug").with_message(
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens.".into(),
        ))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(
        length(min = 1, max = 50, message = "Slug must be between 1 and 50 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGroupDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub id: i64,
    pub slug: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_displays_as_its_title() {
        let group = Group {
            id: 1,
            title: "Cats".to_string(),
            slug: "cats".to_string(),
            description: String::new(),
        };
        assert_eq!(group.to_string(), "Cats");
    }

    #[test]
    fn slug_must_be_url_safe() {
        let dto = CreateGroupDto {
            title: "Cats".to_string(),
            slug: "cats and dogs".to_string(),
            description: String::new(),
        };
        assert!(dto.validate().is_err());
    }
}
