use axum::{
    Json, debug_handler,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::appresult::{AppError, AppResult};
use crate::db::UserSummary;
use crate::session::USER_ID;
use crate::AppState;

use super::hash_password;

#[derive(Deserialize)]
pub(crate) struct SignupBody {
    name: String,
    email: String,
    password: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn signup(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(SignupBody {
        name,
        email,
        password,
    }): Json<SignupBody>,
) -> AppResult<impl IntoResponse> {
    let name = name.trim().to_owned();
    let email = email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() {
        return Err(AppError::InvalidOperation(
            "name and email are required".to_owned(),
        ));
    }
    if password.len() < 8 {
        return Err(AppError::InvalidOperation(
            "password must be at least 8 characters".to_owned(),
        ));
    }

    let id = Uuid::now_v7();
    let result =
        sqlx::query("INSERT INTO users (id,name,email,profile_pic,password_hash) VALUES (?,?,?,?,?)")
            .bind(id.to_string())
            .bind(&name)
            .bind(&email)
            .bind("")
            .bind(hash_password(&password))
            .execute(&db_pool)
            .await;

    if let Err(err) = result {
        return match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Err(
                AppError::Conflict("email already registered".to_owned()),
            ),
            other => Err(other.into()),
        };
    }

    session.insert(USER_ID, id).await?;
    tracing::info!(user = %id, "new user registered");

    Ok((
        StatusCode::CREATED,
        Json(UserSummary {
            id,
            name,
            email,
            profile_pic: String::new(),
        }),
    ))
}
