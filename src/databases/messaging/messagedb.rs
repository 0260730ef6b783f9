use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// One stored message. Soft deletion is tracked per side: a message hidden
/// from the sender may still be visible to the recipient, and vice versa.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i32,
    pub sender_id: i32,
    pub recipient_id: Option<i32>,
    pub parent_msg_id: Option<i32>,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub replied_at: Option<DateTime<Utc>>,
    pub sender_deleted_at: Option<DateTime<Utc>>,
    pub recipient_deleted_at: Option<DateTime<Utc>>,
}

/// Field values for an admin-authored message. The admin form may pre-set
/// any of the timestamp columns; clones produced by a fan-out reuse the same
/// values with only the recipient changed.
#[derive(Debug)]
pub struct AdminMessageRow<'a> {
    pub sender_id: i32,
    pub parent_msg_id: Option<i32>,
    pub subject: &'a str,
    pub body: &'a str,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub replied_at: Option<DateTime<Utc>>,
    pub sender_deleted_at: Option<DateTime<Utc>>,
    pub recipient_deleted_at: Option<DateTime<Utc>>,
}

pub async fn create_message(
    pool: &PgPool,
    sender_id: i32,
    recipient_id: i32,
    parent_msg_id: Option<i32>,
    subject: &str,
    body: &str,
) -> Result<Message, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "INSERT INTO messages (sender_id, recipient_id, parent_msg_id, subject, body)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(sender_id)
    .bind(recipient_id)
    .bind(parent_msg_id)
    .bind(subject)
    .bind(body)
    .fetch_one(pool)
    .await
}

pub async fn insert_admin_message(
    pool: &PgPool,
    row: &AdminMessageRow<'_>,
    recipient_id: i32,
) -> Result<i32, sqlx::Error> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO messages
            (sender_id, recipient_id, parent_msg_id, subject, body,
             sent_at, read_at, replied_at, sender_deleted_at, recipient_deleted_at)
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, now()), $7, $8, $9, $10)
         RETURNING id",
    )
    .bind(row.sender_id)
    .bind(recipient_id)
    .bind(row.parent_msg_id)
    .bind(row.subject)
    .bind(row.body)
    .bind(row.sent_at)
    .bind(row.read_at)
    .bind(row.replied_at)
    .bind(row.sender_deleted_at)
    .bind(row.recipient_deleted_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn inbox(pool: &PgPool, user_id: i32) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "SELECT * FROM messages
         WHERE recipient_id = $1 AND recipient_deleted_at IS NULL
         ORDER BY sent_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn outbox(pool: &PgPool, user_id: i32) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "SELECT * FROM messages
         WHERE sender_id = $1 AND sender_deleted_at IS NULL
         ORDER BY sent_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn trash(pool: &PgPool, user_id: i32) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "SELECT * FROM messages
         WHERE (recipient_id = $1 AND recipient_deleted_at IS NOT NULL)
            OR (sender_id = $1 AND sender_deleted_at IS NOT NULL)
         ORDER BY sent_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Unread = received, never read, not soft-deleted on the recipient side.
pub async fn unread_count(pool: &PgPool, user_id: i32) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM messages
         WHERE recipient_id = $1 AND read_at IS NULL AND recipient_deleted_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn fetch_for_participant(
    pool: &PgPool,
    message_id: i32,
    user_id: i32,
) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "SELECT * FROM messages
         WHERE id = $1 AND (sender_id = $2 OR recipient_id = $2)",
    )
    .bind(message_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn mark_read(pool: &PgPool, message_id: i32) -> Result<Message, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "UPDATE messages SET read_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(message_id)
    .fetch_one(pool)
    .await
}

pub async fn mark_replied(pool: &PgPool, message_id: i32) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE messages SET replied_at = now() WHERE id = $1")
        .bind(message_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Sets or clears the soft-deletion stamp for whichever sides the caller
/// holds. Both flags may apply when a user messaged themselves.
pub async fn set_deleted(
    pool: &PgPool,
    message_id: i32,
    as_sender: bool,
    as_recipient: bool,
    deleted: bool,
) -> Result<Message, sqlx::Error> {
    let stamp: Option<DateTime<Utc>> = if deleted { Some(Utc::now()) } else { None };

    sqlx::query_as::<_, Message>(
        "UPDATE messages SET
            sender_deleted_at = CASE WHEN $2 THEN $4 ELSE sender_deleted_at END,
            recipient_deleted_at = CASE WHEN $3 THEN $4 ELSE recipient_deleted_at END
         WHERE id = $1
         RETURNING *",
    )
    .bind(message_id)
    .bind(as_sender)
    .bind(as_recipient)
    .bind(stamp)
    .fetch_one(pool)
    .await
}

/// Admin changelist: newest first, optional subject/body substring search.
pub async fn admin_list(pool: &PgPool, search: Option<&str>) -> Result<Vec<Message>, sqlx::Error> {
    match search {
        Some(term) => {
            let pattern = format!("%{}%", term);
            sqlx::query_as::<_, Message>(
                "SELECT * FROM messages
                 WHERE subject ILIKE $1 OR body ILIKE $1
                 ORDER BY sent_at DESC
                 LIMIT 100",
            )
            .bind(pattern)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Message>(
                "SELECT * FROM messages ORDER BY sent_at DESC LIMIT 100",
            )
            .fetch_all(pool)
            .await
        }
    }
}
