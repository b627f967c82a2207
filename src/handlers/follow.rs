use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};

use crate::{
    middleware::{login_required, JWTAuthMiddeware},
    models::response::PageQuery,
    AppState, Result,
};

use super::{found, profile_url};

pub fn follow_handler() -> Router {
    Router::new()
        .route("/follow/", get(follow_index))
        .route("/profile/{username}/follow/", get(profile_follow))
        .route("/profile/{username}/unfollow/", get(profile_unfollow))
        .route_layer(middleware::from_fn(login_required))
}

async fn follow_index(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = app_state
        .feed_service
        .follow_index(&auth.user, query.page.as_deref())
        .await?;
    Ok(Json(page))
}

async fn profile_follow(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(username): Path<String>,
) -> Result<Response> {
    app_state
        .follow_service
        .follow(&auth.user, &username)
        .await?;
    Ok(found(&profile_url(&username)))
}

async fn profile_unfollow(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(username): Path<String>,
) -> Result<Response> {
    app_state
        .follow_service
        .unfollow(&auth.user, &username)
        .await?;
    Ok(found(&profile_url(&username)))
}
