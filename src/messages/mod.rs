mod conversation;
mod send;

use axum::{Router, routing::get};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{peer}", get(conversation::conversation).post(send::send))
}
