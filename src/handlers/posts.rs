use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde_json::json;
use validator::Validate;

use crate::{
    middleware::{login_required, JWTAuthMiddeware, Viewer},
    models::{comments::CommentForm, posts::PostForm, response::PageQuery},
    services::{
        permissions::Action,
        posts::{invalid_group, NewPost, PostEdit},
    },
    AppState, Error, Result,
};

use super::{found, post_detail_url, profile_url, raw_json};

pub fn posts_handler() -> Router {
    let members_only = Router::new()
        .route("/create/", get(create_form).post(create_post))
        .route("/posts/{post_id}/edit/", get(edit_form).post(edit_post))
        .route("/posts/{post_id}/delete/", post(delete_post))
        .route("/posts/{post_id}/comment/", post(add_comment))
        .route_layer(middleware::from_fn(login_required));

    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{post_id}/", get(post_detail))
        .merge(members_only)
}

async fn index(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let rendered = app_state.feed_service.index(query.page.as_deref()).await?;
    Ok(raw_json(rendered))
}

async fn group_posts(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = app_state
        .feed_service
        .group_posts(&slug, query.page.as_deref())
        .await?;
    Ok(Json(page))
}

async fn profile(
    Extension(app_state): Extension<Arc<AppState>>,
    viewer: Viewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = app_state
        .feed_service
        .profile(&username, query.page.as_deref(), viewer.user())
        .await?;
    Ok(Json(page))
}

async fn post_detail(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let page = app_state.feed_service.post_detail(post_id).await?;
    Ok(Json(page))
}

async fn read_post_form(mut multipart: Multipart) -> Result<PostForm> {
    let mut form = PostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Invalid multipart data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => {
                form.text = field
                    .text()
                    .await
                    .map_err(|e| Error::BadRequest(format!("Failed to read text: {}", e)))?;
            }
            "group" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| Error::BadRequest(format!("Failed to read group: {}", e)))?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    form.group = Some(raw.parse().map_err(|_| invalid_group())?);
                }
            }
            "image" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::BadRequest(format!("Failed to read image: {}", e)))?;
                if !bytes.is_empty() {
                    form.image = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn create_form(Extension(app_state): Extension<Arc<AppState>>) -> Result<impl IntoResponse> {
    let groups = app_state.groups_service.list_groups().await?;
    Ok(Json(json!({
        "form": ["text", "group", "image"],
        "groups": groups,
        "is_edit": false,
    })))
}

async fn create_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_post_form(multipart).await?;
    form.validate()?;

    app_state
        .posts_service
        .create_post(
            &auth.user,
            NewPost {
                text: form.text,
                group: form.group,
                image: form.image,
            },
        )
        .await?;

    Ok(Redirect::to(&profile_url(&auth.user.username)).into_response())
}

async fn edit_form(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(post_id): Path<i64>,
) -> Result<Response> {
    let access = app_state
        .posts_service
        .access(&auth.user, post_id, Action::Update)
        .await?;
    if !access.is_allowed() {
        return Ok(found(&post_detail_url(post_id)));
    }

    let post = app_state.posts_service.get_post(post_id).await?;
    let groups = app_state.groups_service.list_groups().await?;
    Ok(Json(json!({
        "form": ["text", "group", "image"],
        "post": post,
        "groups": groups,
        "is_edit": true,
    }))
    .into_response())
}

async fn edit_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(post_id): Path<i64>,
    multipart: Multipart,
) -> Result<Response> {
    let access = app_state
        .posts_service
        .access(&auth.user, post_id, Action::Update)
        .await?;
    if !access.is_allowed() {
        tracing::warn!(post_id, user = %auth.user.username, "Edit attempt by non-author");
        return Ok(found(&post_detail_url(post_id)));
    }

    let form = read_post_form(multipart).await?;
    form.validate()?;

    app_state
        .posts_service
        .update_post(
            &auth.user,
            post_id,
            PostEdit {
                text: Some(form.text),
                group: Some(form.group),
                image: form.image,
            },
        )
        .await?;

    Ok(Redirect::to(&post_detail_url(post_id)).into_response())
}

async fn delete_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(post_id): Path<i64>,
) -> Result<Response> {
    let access = app_state
        .posts_service
        .access(&auth.user, post_id, Action::Destroy)
        .await?;
    if !access.is_allowed() {
        return Ok(found(&post_detail_url(post_id)));
    }

    app_state
        .posts_service
        .delete_post(&auth.user, post_id)
        .await?;

    Ok(Redirect::to(&profile_url(&auth.user.username)).into_response())
}

async fn add_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(post_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    if form.validate().is_ok() {
        app_state
            .posts_service
            .add_comment(&auth.user, post_id, form.text.trim())
            .await?;
    } else {
        app_state.posts_service.get_post(post_id).await?;
    }

    Ok(Redirect::to(&post_detail_url(post_id)).into_response())
}
