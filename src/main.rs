use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use driftchat::{AppState, auth, db, friends, live, messages};
use driftchat::{presence::PresenceRegistry, uploads::DiskImageStore};
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("driftchat=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:driftchat.db?mode=rwc".to_owned());
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&database_url)
        .await?;
    db::init(&db_pool).await?;

    let upload_dir = dotenv::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_owned());
    let app_state = AppState {
        db_pool,
        presence: PresenceRegistry::new(),
        images: Arc::new(DiskImageStore::new(&upload_dir, "/uploads")),
    };

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(7)));

    let mut app = Router::new()
        .route("/", get(health))
        .route("/ws", get(live::ws))
        .nest("/api/auth", auth::router())
        .nest("/api/friends", friends::router())
        .nest("/api/messages", messages::router())
        .nest_service("/uploads", ServeDir::new(&upload_dir))
        .with_state(app_state)
        .layer(session_layer);

    if let Ok(origin) = dotenv::var("CLIENT_URL") {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origin.parse::<HeaderValue>()?)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true),
        );
    }

    let bind = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "driftchat listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
