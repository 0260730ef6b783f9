use serde::Deserialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Deserialize, FromRow)]
pub struct LoginUser {
    pub id: i32,
    pub hashed_password: String,
    pub status: String,
}

pub async fn get_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<LoginUser>, sqlx::Error> {
    let result = sqlx::query_as::<_, LoginUser>(
        r#"
        SELECT id, password AS hashed_password, status
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await;

    result
}

pub async fn user_exists(pool: &PgPool, username: &str, email: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("SELECT 1 FROM users WHERE username = $1 OR email = $2")
        .bind(username)
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(result.is_some())
}

pub async fn user_id_exists(pool: &PgPool, user_id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("SELECT 1 FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(result.is_some())
}

pub async fn insert_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    hashed_password: &str,
) -> Result<i32, sqlx::Error> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO users (username, email, password, status)
         VALUES ($1, $2, $3, 'user')
         RETURNING id",
    )
    .bind(username)
    .bind(email)
    .bind(hashed_password)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
