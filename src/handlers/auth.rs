use std::sync::Arc;

use axum::{
    extract::Query,
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde_json::json;
use tower_cookies::Cookie;
use validator::Validate;

use crate::{
    middleware::{login_required, JWTAuthMiddeware, TOKEN_COOKIE},
    models::{
        response::{NextQuery, Response as StatusResponse},
        users::{FilterUserDto, LoginForm, PasswordChangeForm, SignupForm, TokenResponseDto},
    },
    AppState, Error, Result,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/password_change/", post(password_change))
        .route_layer(middleware::from_fn(login_required))
        .route("/signup/", get(signup_form).post(signup))
        .route("/login/", get(login_form).post(login))
        .route("/logout/", get(logout).post(logout))
}

/// `POST /v1/api-token-auth/`
pub async fn obtain_token(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(credentials): Json<LoginForm>,
) -> Result<impl IntoResponse> {
    credentials.validate()?;

    let (_, token) = app_state
        .auth_service
        .login(&credentials.username, &credentials.password)
        .await?;

    Ok(Json(TokenResponseDto { token }))
}

fn with_token_cookie(mut response: Response, token: &str, max_age_minutes: i64) -> Result<Response> {
    let cookie = Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .max_age(time::Duration::minutes(max_age_minutes))
        .http_only(true)
        .build();

    let value = HeaderValue::from_str(&cookie.to_string()).map_err(|_| Error::InternalServerError)?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

/// Only local paths are honoured as a post-login destination.
fn safe_next(next: Option<String>) -> String {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
        _ => "/".to_string(),
    }
}

async fn signup_form() -> impl IntoResponse {
    Json(json!({
        "form": ["username", "first_name", "last_name", "email", "password1", "password2"],
    }))
}

async fn signup(
    Extension(app_state): Extension<Arc<AppState>>,
    Form(mut form): Form<SignupForm>,
) -> Result<Response> {
    form.email = form.email.filter(|email| !email.trim().is_empty());
    form.validate()?;

    let user = app_state.auth_service.register(form).await?;
    let token = app_state.auth_service.generate_token(user.id)?;

    with_token_cookie(
        Redirect::to("/").into_response(),
        &token,
        app_state.auth_service.token_max_age_minutes(),
    )
}

async fn login_form(Query(query): Query<NextQuery>) -> impl IntoResponse {
    Json(json!({
        "form": ["username", "password"],
        "next": safe_next(query.next),
    }))
}

async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    form.validate()?;

    let (user, token) = app_state
        .auth_service
        .login(&form.username, &form.password)
        .await?;
    tracing::info!(username = %user.username, "User logged in");

    with_token_cookie(
        Redirect::to(&safe_next(query.next)).into_response(),
        &token,
        app_state.auth_service.token_max_age_minutes(),
    )
}

async fn logout() -> Result<Response> {
    let response = Json(StatusResponse {
        status: "success",
        message: "You have been logged out.".to_string(),
    })
    .into_response();

    with_token_cookie(response, "", 0)
}

async fn password_change(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Form(form): Form<PasswordChangeForm>,
) -> Result<impl IntoResponse> {
    form.validate()?;

    app_state
        .users_service
        .change_password(&auth.user, form)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": "Your password was changed.",
            "user": FilterUserDto::filter_user(&auth.user),
        })),
    ))
}
