pub mod appresult;
pub mod auth;
pub mod db;
pub mod friends;
pub mod live;
pub mod messages;
pub mod presence;
pub mod session;
pub mod uploads;

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

pub use appresult::{AppError, AppResult};

use crate::presence::PresenceRegistry;
use crate::uploads::ImageStore;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub presence: PresenceRegistry,
    pub images: Arc<dyn ImageStore>,
}
