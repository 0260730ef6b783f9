use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SessionUser {
    pub id: i32,
    pub username: String,
    pub status: String,
}

pub async fn create_session(pool: &PgPool, user_id: i32) -> Result<Uuid, sqlx::Error> {
    let token = Uuid::new_v4();

    sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
        .bind(token)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(token)
}

pub async fn delete_session(pool: &PgPool, token: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn user_for_token(pool: &PgPool, token: Uuid) -> Result<Option<SessionUser>, sqlx::Error> {
    let result = sqlx::query_as::<_, SessionUser>(
        r#"
        SELECT users.id, users.username, users.status
        FROM sessions
        JOIN users ON users.id = sessions.user_id
        WHERE sessions.token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await;

    result
}
