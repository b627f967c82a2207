use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    handlers::found,
    models::users::{User, UserRole},
    AppState, Error, Result,
};

pub const TOKEN_COOKIE: &str = "token";
pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddeware {
    pub user: User,
}

fn cookie_token(req: &Request) -> Option<String> {
    CookieJar::from_headers(req.headers())
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

fn header_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| {
            auth_value
                .strip_prefix("Bearer ")
                .or_else(|| auth_value.strip_prefix("Token "))
                .map(|stripped| stripped.trim().to_string())
        })
}

async fn resolve_user(app_state: &AppState, token: String) -> Option<User> {
    let user_id = app_state.auth_service.decode_token(token).ok()?;
    app_state.users_service.get_user(user_id).await.ok()
}

/// Resolves the current user, if any, and stores it in the request
/// extensions. The cookie is tried first. A stale cookie falls through to the
/// `Authorization` header, and a bad header is rejected.
pub async fn auth(mut req: Request, next: Next) -> Result<impl IntoResponse> {
    let app_state = req
        .extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or(Error::InternalServerError)?;

    let mut user = None;
    if let Some(token) = cookie_token(&req) {
        user = resolve_user(&app_state, token).await;
        if user.is_none() {
            tracing::debug!("Ignoring stale token cookie");
        }
    }
    if user.is_none() {
        if let Some(token) = header_token(&req) {
            user = Some(
                resolve_user(&app_state, token)
                    .await
                    .ok_or(Error::Unauthorized)?,
            );
        }
    }

    if let Some(user) = user {
        req.extensions_mut().insert(JWTAuthMiddeware { user });
    }

    Ok(next.run(req).await)
}

/// Sends anonymous visitors to the login page, remembering where they were
/// going.
pub async fn login_required(req: Request, next: Next) -> Response {
    if req.extensions().get::<JWTAuthMiddeware>().is_some() {
        return next.run(req).await;
    }

    let next_path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    found(&login_redirect(&next_path))
}

pub fn login_redirect(next_path: &str) -> String {
    format!("{}?next={}", LOGIN_URL, urlencoding::encode(next_path))
}

/// Reads are open to everyone, writes need a user.
pub async fn authenticated_or_read_only(req: Request, next: Next) -> Result<impl IntoResponse> {
    let safe = matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS);
    if !safe && req.extensions().get::<JWTAuthMiddeware>().is_none() {
        return Err(Error::Unauthorized);
    }

    Ok(next.run(req).await)
}

pub async fn role_check(
    Extension(_app_state): Extension<Arc<AppState>>,
    req: Request,
    next: Next,
    required_roles: Vec<UserRole>,
) -> Result<impl IntoResponse> {
    let user = req
        .extensions()
        .get::<JWTAuthMiddeware>()
        .ok_or_else(|| Error::Unauthorized)?;

    if !required_roles.contains(&user.user.role) {
        return Err(Error::Forbidden(
            "You do not have permission to perform this action.".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

/// The signed-in user, or `None` for anonymous visitors.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> core::result::Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<JWTAuthMiddeware>()
                .map(|auth| auth.user.clone()),
        ))
    }
}
