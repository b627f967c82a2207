use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    middleware::{authenticated_or_read_only, JWTAuthMiddeware},
    models::{
        comments::{CommentForm, CommentResponseDto, UpdateCommentDto},
        posts::{CreatePostDto, PostResponseDto, UpdatePostDto},
    },
    services::{
        permissions::Action,
        posts::{NewPost, PostEdit},
    },
    AppState, Error, Result,
};

use super::{auth::obtain_token, user::users_handler};

pub fn api_handler() -> Router {
    Router::new()
        .route("/posts/", get(list_posts).post(create_post))
        .route(
            "/posts/{post_id}/",
            get(get_post)
                .put(replace_post)
                .patch(patch_post)
                .delete(delete_post),
        )
        .route(
            "/posts/{post_id}/comments/",
            get(list_comments).post(create_comment),
        )
        .route(
            "/posts/{post_id}/comments/{comment_id}/",
            get(get_comment)
                .put(replace_comment)
                .patch(patch_comment)
                .delete(delete_comment),
        )
        .route("/groups/", get(list_groups))
        .route("/groups/{group_id}/", get(get_group))
        .nest("/users", users_handler())
        .route_layer(middleware::from_fn(authenticated_or_read_only))
        .route("/api-token-auth/", post(obtain_token))
}

fn required(field: &'static str) -> Error {
    let mut errors = ValidationErrors::new();
    errors.add(
        field,
        ValidationError::new("required").with_message("This field is required.".into()),
    );
    Error::Validation(errors)
}

/// Accepts plain base64 as well as a `data:<mime>;base64,` URI.
fn decode_image(payload: Option<String>) -> Result<Option<Vec<u8>>> {
    let Some(payload) = payload.filter(|p| !p.trim().is_empty()) else {
        return Ok(None);
    };
    let encoded = match payload.split_once(";base64,") {
        Some((_, data)) => data,
        None => payload.as_str(),
    };

    STANDARD
        .decode(encoded.trim())
        .map(Some)
        .map_err(|_| Error::Image("Upload a valid image.".to_string()))
}

async fn list_posts(Extension(app_state): Extension<Arc<AppState>>) -> Result<impl IntoResponse> {
    let posts: Vec<PostResponseDto> = app_state
        .posts_service
        .list_posts()
        .await?
        .into_iter()
        .map(PostResponseDto::from)
        .collect();
    Ok(Json(posts))
}

async fn create_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreatePostDto>,
) -> Result<impl IntoResponse> {
    body.validate()?;

    let post = app_state
        .posts_service
        .create_post(
            &auth.user,
            NewPost {
                text: body.text,
                group: body.group,
                image: decode_image(body.image)?,
            },
        )
        .await?;

    let view = app_state.posts_service.get_post(post.id).await?;
    Ok((StatusCode::CREATED, Json(PostResponseDto::from(view))))
}

async fn get_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let view = app_state.posts_service.get_post(post_id).await?;
    Ok(Json(PostResponseDto::from(view)))
}

async fn apply_post_update(
    app_state: &AppState,
    auth: &JWTAuthMiddeware,
    post_id: i64,
    body: UpdatePostDto,
) -> Result<PostResponseDto> {
    body.validate()?;

    app_state
        .posts_service
        .update_post(
            &auth.user,
            post_id,
            PostEdit {
                text: body.text,
                group: body.group,
                image: decode_image(body.image)?,
            },
        )
        .await?;

    let view = app_state.posts_service.get_post(post_id).await?;
    Ok(PostResponseDto::from(view))
}

async fn replace_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(post_id): Path<i64>,
    Json(body): Json<UpdatePostDto>,
) -> Result<impl IntoResponse> {
    app_state
        .posts_service
        .access(&auth.user, post_id, Action::Update)
        .await?
        .into_result()?;
    if body.text.is_none() {
        return Err(required("text"));
    }

    let post = apply_post_update(&app_state, &auth, post_id, body).await?;
    Ok(Json(post))
}

async fn patch_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(post_id): Path<i64>,
    Json(body): Json<UpdatePostDto>,
) -> Result<impl IntoResponse> {
    let post = apply_post_update(&app_state, &auth, post_id, body).await?;
    Ok(Json(post))
}

async fn delete_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse> {
    app_state
        .posts_service
        .delete_post(&auth.user, post_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_comments(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let comments: Vec<CommentResponseDto> = app_state
        .posts_service
        .get_comments(post_id)
        .await?
        .into_iter()
        .map(CommentResponseDto::from)
        .collect();
    Ok(Json(comments))
}

async fn create_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(post_id): Path<i64>,
    Json(body): Json<CommentForm>,
) -> Result<impl IntoResponse> {
    body.validate()?;

    let comment = app_state
        .posts_service
        .add_comment(&auth.user, post_id, &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(CommentResponseDto::from(comment))))
}

async fn get_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse> {
    let comment = app_state
        .posts_service
        .get_comment(post_id, comment_id)
        .await?;
    Ok(Json(CommentResponseDto::from(comment)))
}

async fn replace_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    Json(body): Json<UpdateCommentDto>,
) -> Result<impl IntoResponse> {
    if body.text.is_none() {
        return Err(required("text"));
    }
    patch_comment(
        Extension(app_state),
        Extension(auth),
        Path((post_id, comment_id)),
        Json(body),
    )
    .await
}

async fn patch_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    Json(body): Json<UpdateCommentDto>,
) -> Result<Json<CommentResponseDto>> {
    body.validate()?;

    let comment = app_state
        .posts_service
        .update_comment(&auth.user, post_id, comment_id, body.text.as_deref())
        .await?;
    Ok(Json(CommentResponseDto::from(comment)))
}

async fn delete_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse> {
    app_state
        .posts_service
        .delete_comment(&auth.user, post_id, comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_groups(Extension(app_state): Extension<Arc<AppState>>) -> Result<impl IntoResponse> {
    let groups = app_state.groups_service.list_groups().await?;
    Ok(Json(groups))
}

async fn get_group(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(group_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let group = app_state.groups_service.get_group(group_id).await?;
    Ok(Json(group))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_payload_may_be_a_data_uri() {
        let plain = decode_image(Some(STANDARD.encode(b"bytes"))).unwrap();
        let uri = decode_image(Some(format!(
            "data:image/png;base64,{}",
            STANDARD.encode(b"bytes")
        )))
        .unwrap();

        assert_eq!(plain.as_deref(), Some(&b"bytes"[..]));
        assert_eq!(uri, plain);
        assert_eq!(decode_image(None).unwrap(), None);
        assert!(matches!(
            decode_image(Some("not base64!".to_string())),
            Err(Error::Image(_))
        ));
    }
}
