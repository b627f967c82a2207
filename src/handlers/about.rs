use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

pub fn about_handler() -> Router {
    Router::new()
        .route("/author/", get(author))
        .route("/tech/", get(tech))
}

async fn author() -> impl IntoResponse {
    Json(json!({
        "title": "About the author",
        "text": "Yatube is a small blogging platform: write posts, group them, follow the authors you like.",
    }))
}

async fn tech() -> impl IntoResponse {
    Json(json!({
        "title": "Technologies",
        "stack": ["Rust", "axum", "sqlx", "PostgreSQL", "tokio"],
    }))
}
