use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

pub mod about;
pub mod admin;
pub mod api;
pub mod auth;
pub mod follow;
pub mod posts;
pub mod user;

/// `302 Found`, the status browsers follow after a form post.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// A body that is already serialized JSON.
pub fn raw_json(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}
