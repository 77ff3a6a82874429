use axum::{Json, debug_handler, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppState;
use crate::appresult::{AppError, AppResult};
use crate::db::{UserRow, UserSummary};
use crate::session::CurrentUser;

#[derive(Deserialize)]
pub(crate) struct AddFriendBody {
    email: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn add(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    Json(AddFriendBody { email }): Json<AddFriendBody>,
) -> AppResult<impl IntoResponse> {
    let friend = add_friend(&db_pool, user_id, email.trim()).await?;
    tracing::info!(user = %user_id, friend = %friend.id, "friend added");

    Ok(Json(json!({
        "message": "friend added",
        "friend": friend,
    })))
}

/// Records a friendship edge between the requester and the user registered
/// under `target_email`, returning the target's public projection.
pub(crate) async fn add_friend(
    db_pool: &SqlitePool,
    requester_id: Uuid,
    target_email: &str,
) -> AppResult<UserSummary> {
    let row: Option<UserRow> =
        sqlx::query_as("SELECT id,name,email,profile_pic FROM users WHERE email=?")
            .bind(target_email)
            .fetch_optional(db_pool)
            .await?;
    let Some(row) = row else {
        return Err(AppError::NotFound("user not found".to_owned()));
    };
    let target = UserSummary::from_row(row)?;

    if target.id == requester_id {
        return Err(AppError::InvalidOperation(
            "cannot add yourself as friend".to_owned(),
        ));
    }

    // one edge per unordered pair; the primary key turns a duplicate add from
    // either side into a conflict
    let (user_a, user_b) = edge_key(requester_id, target.id);
    if let Err(err) = sqlx::query("INSERT INTO friendships (user_a,user_b) VALUES (?,?)")
        .bind(user_a)
        .bind(user_b)
        .execute(db_pool)
        .await
    {
        return match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Err(AppError::Conflict("already friends".to_owned()))
            }
            other => Err(other.into()),
        };
    }

    Ok(target)
}

fn edge_key(x: Uuid, y: Uuid) -> (String, String) {
    let (x, y) = (x.to_string(), y.to_string());
    if x < y { (x, y) } else { (y, x) }
}
