use serde::{Deserialize, Deserializer};
use validator::ValidationError;

pub mod comments;
pub mod follows;
pub mod groups;
pub mod posts;
pub mod response;
pub mod users;

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message("This field is required.".into()));
    }
    Ok(())
}

/// Keeps an explicit `null` apart from a missing key.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
