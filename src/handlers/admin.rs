use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    middleware::role_check,
    models::{
        groups::{CreateGroupDto, UpdateGroupDto},
        response::Response,
        users::UserRole,
    },
    AppState, Result,
};

pub fn admin_handler() -> Router {
    Router::new()
        .route("/groups/", post(create_group))
        .route("/groups/{slug}/", delete(delete_group).put(update_group))
        .route("/users/{username}/", delete(delete_user))
        .route("/cache/", delete(clear_cache))
        .route_layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin])
        }))
}

async fn create_group(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateGroupDto>,
) -> Result<impl IntoResponse> {
    body.validate()?;

    let group = app_state.groups_service.create_group(body).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn update_group(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(body): Json<UpdateGroupDto>,
) -> Result<impl IntoResponse> {
    body.validate()?;

    let group = app_state.groups_service.update_group(&slug, body).await?;
    Ok(Json(group))
}

async fn delete_group(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    app_state.groups_service.delete_group(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    app_state.users_service.delete_user(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_cache(Extension(app_state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let cache = app_state.feed_service.cache();
    let dropped = cache.len();
    cache.clear();
    tracing::info!(dropped, "Cleared feed cache");

    Json(Response {
        status: "success",
        message: format!("Dropped {} cached pages.", dropped),
    })
}
