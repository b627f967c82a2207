use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: UserRole,
}

fn validate_username(username: &str) -> Result<(), validator::ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if username.chars().all(allowed) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("username").with_message(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        ))
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct SignupForm {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password1: String,
    #[validate(must_match(other = "password1", message = "passwords do not match"))]
    pub password2: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Validate, Default, Clone, Serialize, Deserialize)]
pub struct PasswordChangeForm {
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,
    #[validate(length(min = 8, message = "new password must be at least 8 characters"))]
    pub new_password1: String,
    #[validate(must_match(other = "new_password1", message = "new passwords do not match"))]
    pub new_password2: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            role: user.role.to_str().to_string(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponseDto {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, password1: &str, password2: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            password1: password1.to_string(),
            password2: password2.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn signup_rejects_mismatched_passwords() {
        let errors = form("leo", "correct horse", "battery staple")
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("password2"));
    }

    #[test]
    fn signup_rejects_spaces_in_username() {
        let errors = form("leo tolstoy", "correct horse", "correct horse")
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
    }

    #[test]
    fn signup_accepts_punctuated_usernames() {
        assert!(form("leo.t+1@x_y-z", "correct horse", "correct horse")
            .validate()
            .is_ok());
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::now_v7(),
            username: "leo".to_string(),
            email: None,
            first_name: String::new(),
            last_name: String::new(),
            password: "$argon2id$secret".to_string(),
            role: UserRole::User,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "user");
    }
}
