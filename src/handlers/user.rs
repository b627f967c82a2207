use axum::{middleware, response::IntoResponse, routing::get, Extension, Json, Router};
use serde::Serialize;

use crate::{
    middleware::{role_check, JWTAuthMiddeware},
    models::users::{FilterUserDto, UserRole},
    Result,
};

#[derive(Debug, Serialize)]
struct UserResponseDto {
    status: &'static str,
    user: FilterUserDto,
}

pub fn users_handler() -> Router {
    Router::new().route(
        "/me/",
        get(get_me).layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin, UserRole::User])
        })),
    )
}

async fn get_me(Extension(user): Extension<JWTAuthMiddeware>) -> Result<impl IntoResponse> {
    Ok(Json(UserResponseDto {
        status: "success",
        user: FilterUserDto::filter_user(&user.user),
    }))
}
