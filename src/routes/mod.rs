use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware, Extension, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        about::about_handler, admin::admin_handler, api::api_handler, auth::auth_handler,
        follow::follow_handler, posts::posts_handler,
    },
    middleware::auth,
    AppState,
};

pub fn create_routes(app_state: Arc<AppState>) -> Router {
    let media = ServeDir::new(&app_state.config.media_root);

    Router::new()
        .merge(posts_handler())
        .merge(follow_handler())
        .nest("/about", about_handler())
        .nest("/auth", auth_handler())
        .nest("/v1", api_handler())
        .nest("/admin", admin_handler())
        .nest_service("/media", media)
        .layer(middleware::from_fn(auth))
        .layer(Extension(app_state))
        .layer(configure_cors())
        .layer(TraceLayer::new_for_http())
}

pub fn configure_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
