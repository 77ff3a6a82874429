use std::sync::Arc;

use axum::{
    Json, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AppState;
use crate::appresult::{AppError, AppResult};
use crate::db::Message;
use crate::live;
use crate::presence::PresenceRegistry;
use crate::session::CurrentUser;
use crate::uploads::{self, ImageStore};

#[derive(Deserialize)]
pub(crate) struct SendBody {
    text: Option<String>,
    /// base64 data URI, uploaded to the image store before the message is
    /// persisted
    image: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn send(
    State(db_pool): State<SqlitePool>,
    State(presence): State<PresenceRegistry>,
    State(images): State<Arc<dyn ImageStore>>,
    CurrentUser(user_id): CurrentUser,
    Path(receiver): Path<Uuid>,
    Json(SendBody { text, image }): Json<SendBody>,
) -> AppResult<impl IntoResponse> {
    let message = send_message(
        &db_pool,
        &presence,
        images.as_ref(),
        user_id,
        receiver,
        text,
        image,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Persists a message, then attempts best-effort live delivery to the
/// receiver's endpoint. Storage is the sole source of truth; a failed or
/// skipped push is invisible to the sender.
pub(crate) async fn send_message(
    db_pool: &SqlitePool,
    presence: &PresenceRegistry,
    images: &dyn ImageStore,
    sender_id: Uuid,
    receiver_id: Uuid,
    text: Option<String>,
    image: Option<String>,
) -> AppResult<Message> {
    let text = text
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty());
    if text.is_none() && image.is_none() {
        return Err(AppError::InvalidOperation(
            "message must carry text or an image".to_owned(),
        ));
    }

    let image_url = match image {
        Some(payload) => {
            let (mime, bytes) =
                uploads::parse_data_uri(&payload).map_err(|e| AppError::UploadError(e.to_string()))?;
            let url = images
                .store(&bytes, &mime)
                .await
                .map_err(|e| AppError::UploadError(e.to_string()))?;
            Some(url)
        }
        None => None,
    };

    let message = Message {
        id: Uuid::now_v7(),
        sender_id,
        receiver_id,
        text,
        image: image_url,
        created_at: OffsetDateTime::now_utc(),
    };

    if let Err(err) = persist(db_pool, &message).await {
        // the upload already committed; compensate before failing the send
        if let Some(url) = &message.image {
            images.remove(url).await;
        }
        return Err(err.into());
    }

    let delivered = presence.push(receiver_id, &live::new_message_event(&message)?);
    tracing::debug!(message = %message.id, receiver = %receiver_id, delivered, "live delivery");

    Ok(message)
}

async fn persist(db_pool: &SqlitePool, message: &Message) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO messages (id,sender_id,receiver_id,text,image,created_at) VALUES (?,?,?,?,?,?)",
    )
    .bind(message.id.to_string())
    .bind(message.sender_id.to_string())
    .bind(message.receiver_id.to_string())
    .bind(message.text.as_deref())
    .bind(message.image.as_deref())
    .bind(message.created_at)
    .execute(db_pool)
    .await?;
    Ok(())
}
