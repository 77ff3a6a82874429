use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::appresult::AppError;

pub const USER_ID: &str = "user_id";

/// The authenticated caller, resolved from the session cookie. Handlers that
/// take this extractor reject with 401 before any domain logic runs.
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, err)| AppError::Internal(anyhow::anyhow!(err)))?;

        match session.get::<Uuid>(USER_ID).await? {
            Some(user_id) => Ok(CurrentUser(user_id)),
            None => Err(AppError::Unauthorized),
        }
    }
}
