use axum::{Json, debug_handler, extract::State};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppState;
use crate::appresult::{AppError, AppResult};
use crate::db::{UserRow, UserSummary};
use crate::session::CurrentUser;

#[debug_handler(state = AppState)]
pub(crate) async fn list(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Vec<UserSummary>>> {
    Ok(Json(list_friends(&db_pool, user_id).await?))
}

/// Resolves the requester's friend set into public projections, ordered by
/// display name then id so the listing is deterministic.
pub(crate) async fn list_friends(
    db_pool: &SqlitePool,
    requester_id: Uuid,
) -> AppResult<Vec<UserSummary>> {
    let requester = requester_id.to_string();

    let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id=?")
        .bind(&requester)
        .fetch_optional(db_pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("user not found".to_owned()));
    }

    let rows: Vec<UserRow> = sqlx::query_as(
        "SELECT u.id,u.name,u.email,u.profile_pic FROM users u \
         JOIN friendships f ON (f.user_a=? AND f.user_b=u.id) OR (f.user_b=? AND f.user_a=u.id) \
         ORDER BY u.name,u.id",
    )
    .bind(&requester)
    .bind(&requester)
    .fetch_all(db_pool)
    .await?;

    rows.into_iter().map(UserSummary::from_row).collect()
}
