mod authentication;
pub mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod models;
mod statistics;

pub use anyhow::Result;
use anyhow::{bail, Context};
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use config::Config;
pub use data_formats::*;
pub use errors::{RequestError, RequestErrorJson};
use handlers::*;
pub use statistics::{DailyStat, StatisticsResponse, TopNoteResponse};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::{
    net::{SocketAddr, TcpListener},
    sync::Arc,
};
use tracing::info;

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// Shared by every handler through an `Extension` layer.
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let pool = init_db(&config.database_url).await?;
        Ok(Arc::new(Self { pool, config }))
    }
}

pub async fn run_app(state: Arc<AppState>, address: SocketAddr) -> Result<()> {
    let app = make_router(state);
    info!("Listening on {}", address);
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        info!("Creating database {}", db_url);
        if let Err(error) = Sqlite::create_database(db_url).await {
            bail!("Failed to create database {}: {}", db_url, error);
        }
    } else {
        info!("Database already exists");
    }
    let pool = SqlitePool::connect(db_url)
        .await
        .with_context(|| format!("Failed to connect to {}", db_url))?;
    info!("Running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");
    Ok(pool)
}

pub fn get_random_free_port() -> Result<(u16, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0").context("Could not bind a free port")?;
    let addr = listener.local_addr().context("Could not get a free port")?;
    Ok((addr.port(), addr))
}

pub fn make_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/check_health", get(alive))
        // auth
        .route("/api/auth/register", post(register_user))
        .route("/api/auth/login", post(login_user))
        .route("/api/auth/me", get(get_current_user))
        // users
        .route("/api/users/:id", get(get_user_profile))
        .route(
            "/api/users/:id/follow",
            post(follow_user).delete(unfollow_user),
        )
        .route("/api/tags", get(list_tags))
        // travel notes
        .route(
            "/api/travel-notes",
            get(list_travel_notes).post(create_travel_note),
        )
        .route(
            "/api/travel-notes/:id",
            get(get_travel_note)
                .put(update_travel_note)
                .delete(delete_travel_note),
        )
        .route("/api/travel-notes/:id/like", post(like_note).delete(unlike_note))
        .route("/api/travel-notes/:id/like/check", get(check_like))
        .route(
            "/api/travel-notes/:id/favorite",
            post(favorite_note).delete(unfavorite_note),
        )
        .route("/api/travel-notes/:id/favorite/check", get(check_favorite))
        .route(
            "/api/travel-notes/:id/comments",
            get(list_comments).post(add_comment),
        )
        .route("/api/comments/:id", delete(delete_comment))
        .route("/api/travel-notes/:id/report", post(report_note))
        // moderation
        .route("/api/travel-notes/:id/approve", post(approve_note))
        .route("/api/travel-notes/:id/reject", post(reject_note))
        .route("/api/admin/notes", get(moderation_queue))
        .route("/api/admin/notes/:id/logs", get(list_review_logs))
        .route("/api/admin/users/:id/role", put(set_user_role))
        .route("/api/admin/tags", post(create_tag))
        .route("/api/admin/reports", get(list_reports))
        // statistics
        .route("/api/mainindex/statistics", get(get_statistics))
        .fallback(not_found)
        .layer(Extension(state))
}
