use axum::{Json, debug_handler, extract::State};
use sqlx::SqlitePool;

use crate::AppState;
use crate::appresult::AppResult;
use crate::db::{self, UserSummary};
use crate::session::CurrentUser;

#[debug_handler(state = AppState)]
pub(crate) async fn me(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<UserSummary>> {
    Ok(Json(db::fetch_user(&db_pool, user_id).await?))
}
