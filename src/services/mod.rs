pub mod auth;
pub mod cache;
pub mod feed;
pub mod follow;
pub mod groups;
pub mod permissions;
pub mod posts;
pub mod user;
