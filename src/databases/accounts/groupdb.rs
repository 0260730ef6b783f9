use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Serialize, FromRow)]
pub struct GroupRow {
    pub id: i32,
    pub name: String,
}

pub async fn list_groups(pool: &PgPool) -> Result<Vec<GroupRow>, sqlx::Error> {
    sqlx::query_as::<_, GroupRow>("SELECT id, name FROM groups ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn group_exists(pool: &PgPool, group_id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("SELECT 1 FROM groups WHERE id = $1")
        .bind(group_id)
        .fetch_optional(pool)
        .await?;

    Ok(result.is_some())
}

pub async fn all_user_ids(pool: &PgPool) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM users ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn group_member_ids(pool: &PgPool, group_id: i32) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT user_id FROM user_groups WHERE group_id = $1 ORDER BY user_id",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await
}
