use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Resource not found")]
    NotFound,
    #[error("Authentication credentials were not provided")]
    Unauthorized,
    #[error("Internal server error")]
    InternalServerError,
    #[error("{0}")]
    BadRequest(String),
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("Database error")]
    DatabaseError(sqlx::Error),
    #[error("Invalid hash format")]
    InvalidHashFormat(argon2::password_hash::Error),
    #[error("{0}")]
    Forbidden(String),
    #[error("Invalid image: {0}")]
    Image(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) | Self::Validation(_) | Self::Image(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InternalServerError | Self::DatabaseError(_) | Self::InvalidHashFormat(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match self {
            Self::Validation(ref errors) => Json(json!({
                "error": self.to_string(),
                "fields": field_messages(errors),
            })),
            _ => Json(json!({ "error": self.to_string() })),
        };

        (status, body).into_response()
    }
}

/// Flattens validator output into `{field: [message, ...]}`.
pub fn field_messages(errors: &ValidationErrors) -> serde_json::Value {
    let fields = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages: Vec<String> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), json!(messages))
        })
        .collect::<serde_json::Map<_, _>>();

    serde_json::Value::Object(fields)
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Self::BadRequest("Object with this value already exists".to_string())
            }
            _ => {
                error!("Database error: {:?}", err);
                Self::DatabaseError(err)
            }
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(err: argon2::password_hash::Error) -> Self {
        error!("Invalid hash format");
        Self::InvalidHashFormat(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn forbidden_carries_its_message() {
        let response = Error::Forbidden("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        assert!(matches!(Error::from(sqlx::Error::RowNotFound), Error::NotFound));
    }

    #[test]
    fn validation_errors_are_grouped_by_field() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "text",
            ValidationError::new("required").with_message("Post text is required".into()),
        );

        let fields = field_messages(&errors);
        assert_eq!(fields["text"][0], "Post text is required");
        assert_eq!(
            Error::Validation(errors).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
