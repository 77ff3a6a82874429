use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppState;
use crate::appresult::AppResult;
use crate::db::{Message, MessageRow};
use crate::session::CurrentUser;

#[debug_handler(state = AppState)]
pub(crate) async fn conversation(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    Path(peer): Path<Uuid>,
) -> AppResult<Json<Vec<Message>>> {
    Ok(Json(get_conversation(&db_pool, user_id, peer).await?))
}

/// Both directions of the pair, pinned to chronological order (creation time,
/// id as tiebreak) so reads from either side agree.
pub(crate) async fn get_conversation(
    db_pool: &SqlitePool,
    me: Uuid,
    peer: Uuid,
) -> AppResult<Vec<Message>> {
    let rows: Vec<MessageRow> = sqlx::query_as(
        "SELECT id,sender_id,receiver_id,text,image,created_at FROM messages \
         WHERE (sender_id=? AND receiver_id=?) OR (sender_id=? AND receiver_id=?) \
         ORDER BY created_at,id",
    )
    .bind(me.to_string())
    .bind(peer.to_string())
    .bind(peer.to_string())
    .bind(me.to_string())
    .fetch_all(db_pool)
    .await?;

    rows.into_iter().map(Message::from_row).collect()
}
