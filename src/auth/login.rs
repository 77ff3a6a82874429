use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::appresult::{AppError, AppResult};
use crate::db::{self, UserSummary};
use crate::session::USER_ID;
use crate::AppState;

use super::verify_password;

#[derive(Deserialize)]
pub(crate) struct LoginBody {
    email: String,
    password: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(LoginBody { email, password }): Json<LoginBody>,
) -> AppResult<Json<UserSummary>> {
    let email = email.trim().to_lowercase();

    // same response for unknown email and wrong password
    let invalid = || AppError::InvalidOperation("invalid credentials".to_owned());

    let row: Option<(String, String)> =
        sqlx::query_as("SELECT id,password_hash FROM users WHERE email=?")
            .bind(&email)
            .fetch_optional(&db_pool)
            .await?;
    let (id, password_hash) = row.ok_or_else(invalid)?;

    if !verify_password(&password_hash, &password) {
        return Err(invalid());
    }

    let user_id = Uuid::parse_str(&id)?;
    session.insert(USER_ID, user_id).await?;
    tracing::info!(user = %user_id, "logged in");

    Ok(Json(db::fetch_user(&db_pool, user_id).await?))
}
