//! # taskbox_api
//!
//! HTTP API library for Taskbox.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, health, profile, tasks, users};
use taskbox_core::auth::jwt::TokenCodec;

/// Shared application state passed to all handlers.
///
/// The only mutable state in the process lives behind the pool; the codec
/// and config are read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Token codec holding the process-wide signing secret.
    pub codec: TokenCodec,
}

impl AppState {
    /// Build state from a pool and config, constructing the token codec
    /// from the configured secret and TTL.
    pub fn new(pool: PgPool, config: ApiConfig) -> Self {
        let codec = TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttl_secs);
        Self {
            pool,
            config,
            codec,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `taskbox_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    taskbox_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/", get(health::health_handler))
        .route("/signup", post(auth::signup_handler))
        .route("/login", post(auth::login_handler));

    // Protected routes (require a valid bearer token)
    let protected = Router::new()
        .route(
            "/tasks",
            get(tasks::list_tasks_handler).post(tasks::create_task_handler),
        )
        .route(
            "/tasks/{id}",
            get(tasks::get_task_handler)
                .put(tasks::update_task_handler)
                .delete(tasks::delete_task_handler),
        )
        .route(
            "/profile",
            get(profile::get_profile_handler)
                .put(profile::update_profile_handler)
                .delete(profile::delete_profile_handler),
        )
        .route("/users", get(users::list_users_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
