use axum::{
    debug_handler,
    extract::{State, WebSocketUpgrade, ws::WebSocket},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use uuid::Uuid;

use crate::appresult::AppResult;
use crate::db::Message;
use crate::presence::PresenceRegistry;
use crate::session::CurrentUser;

pub(crate) fn new_message_event(message: &Message) -> AppResult<String> {
    Ok(serde_json::to_string(&json!({
        "event": "newMessage",
        "data": message,
    }))?)
}

#[debug_handler(state = crate::AppState)]
pub async fn ws(
    State(presence): State<PresenceRegistry>,
    CurrentUser(user_id): CurrentUser,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, presence, user_id))
}

async fn handle_socket(socket: WebSocket, presence: PresenceRegistry, user_id: Uuid) {
    let (endpoint_id, mut rx) = presence.connect(user_id);
    tracing::info!(user = %user_id, endpoint = %endpoint_id, "live channel open");

    let (mut sender, mut receiver) = socket.split();

    let mut push_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if sender.send(event.into()).await.is_err() {
                break;
            }
        }
    });

    // inbound frames are ignored; sending happens over the HTTP surface
    loop {
        tokio::select! {
            frame = receiver.next() => {
                match frame {
                    Some(Ok(_)) => continue,
                    _ => break,
                }
            }
            _ = &mut push_task => break,
        }
    }

    push_task.abort();
    presence.disconnect(user_id, endpoint_id);
    tracing::info!(user = %user_id, endpoint = %endpoint_id, "live channel closed");
}
