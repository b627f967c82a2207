use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use yatube::{
    config::Config,
    models::users::{SignupForm, UserRole},
    repositories::PostgresRepo,
    routes::create_routes,
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("yatube=debug,tower_http=debug")),
        )
        .init();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("🔥 Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("🔥 Failed to run migrations: {:?}", err);
        std::process::exit(1);
    }

    let app_state = Arc::new(AppState::new(Arc::new(PostgresRepo::new(pool)), config));
    bootstrap_admin(&app_state).await;

    let addr = format!("[::]:{}", app_state.config.port);
    let app = create_routes(app_state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind {}: {:?}", addr, err);
            std::process::exit(1);
        }
    };
    tracing::info!("🚀 Listening on {}", addr);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("🔥 Server error: {:?}", err);
    }
}

/// Creates the admin account named by `ADMIN_USERNAME`/`ADMIN_PASSWORD` if it
/// does not exist yet.
async fn bootstrap_admin(app_state: &AppState) {
    let (Some(username), Some(password)) = (
        app_state.config.admin_username.clone(),
        app_state.config.admin_password.clone(),
    ) else {
        return;
    };

    if app_state.users_service.get_by_username(&username).await.is_ok() {
        return;
    }

    let form = SignupForm {
        username,
        password1: password.clone(),
        password2: password,
        ..Default::default()
    };
    match app_state
        .auth_service
        .create_account(form, UserRole::Admin)
        .await
    {
        Ok(user) => tracing::info!(username = %user.username, "Created admin account"),
        Err(err) => tracing::error!("Failed to create admin account: {:?}", err),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", err);
    }
    tracing::info!("Shutting down");
}
