use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::appresult::{AppError, AppResult};

/// Creates the schema if it is not there yet. Runs against whatever the pool
/// points at, which is also how the tests get an in-memory database.
pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            profile_pic TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL
        )",
        // friendship is one edge per unordered pair: user_a < user_b always
        "CREATE TABLE IF NOT EXISTS friendships (
            user_a TEXT NOT NULL,
            user_b TEXT NOT NULL,
            PRIMARY KEY (user_a, user_b)
        )",
        "CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            sender_id TEXT NOT NULL,
            receiver_id TEXT NOT NULL,
            text TEXT,
            image TEXT,
            created_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_messages_pair
            ON messages (sender_id, receiver_id, created_at)",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Public projection of a user record, safe to hand to any caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_pic: String,
}

pub(crate) type UserRow = (String, String, String, String);

impl UserSummary {
    pub(crate) fn from_row((id, name, email, profile_pic): UserRow) -> AppResult<Self> {
        Ok(Self {
            id: Uuid::parse_str(&id)?,
            name,
            email,
            profile_pic,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub(crate) type MessageRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    OffsetDateTime,
);

impl Message {
    pub(crate) fn from_row(
        (id, sender_id, receiver_id, text, image, created_at): MessageRow,
    ) -> AppResult<Self> {
        Ok(Self {
            id: Uuid::parse_str(&id)?,
            sender_id: Uuid::parse_str(&sender_id)?,
            receiver_id: Uuid::parse_str(&receiver_id)?,
            text,
            image,
            created_at,
        })
    }
}

pub(crate) async fn fetch_user(pool: &SqlitePool, id: Uuid) -> AppResult<UserSummary> {
    let row: Option<UserRow> =
        sqlx::query_as("SELECT id,name,email,profile_pic FROM users WHERE id=?")
            .bind(id.to_string())
            .fetch_optional(pool)
            .await?;

    match row {
        Some(row) => UserSummary::from_row(row),
        None => Err(AppError::NotFound("user not found".to_owned())),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    pub(crate) async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init(&pool).await.unwrap();
        pool
    }

    pub(crate) async fn seed_user(pool: &SqlitePool, name: &str, email: &str) -> Uuid {
        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO users (id,name,email,profile_pic,password_hash) VALUES (?,?,?,?,?)")
            .bind(id.to_string())
            .bind(name)
            .bind(email)
            .bind("")
            .bind("!")
            .execute(pool)
            .await
            .unwrap();
        id
    }
}
