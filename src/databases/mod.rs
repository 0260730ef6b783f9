use anyhow::{anyhow, Context, Result};
use sqlx::{Executor, PgPool};
use std::{fs, path::Path};

pub mod accounts;
pub mod messaging;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use rand::{distributions::Alphanumeric, Rng};

use crate::services::email::send_admin_credentials_email;

fn load_all_schemas(schema_dirs: &[&str]) -> Result<String> {
    let mut combined_sql = String::new();

    for dir in schema_dirs {
        let schema_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(dir).join("schema.sql");
        let sql = fs::read_to_string(&schema_path)
            .with_context(|| format!("Failed to read schema file: {:?}", schema_path))?;
        combined_sql.push_str(&sql);
        combined_sql.push('\n');
    }

    Ok(combined_sql)
}

async fn check_tables_exist(pool: &PgPool, tables: &[&str]) -> Result<bool> {
    for &table in tables {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )",
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists.0 {
            println!("Table '{}' does NOT exist.", table);
            return Ok(false);
        }
    }
    Ok(true)
}

pub async fn setup_backend() -> Result<PgPool> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPool::connect(&database_url).await.context("Failed to connect to database")?;

    let schema_dirs = [
        "src/databases/accounts",
        "src/databases/messaging",
    ];

    let combined_schema_sql = load_all_schemas(&schema_dirs)?;

    let required_tables = [
        "users",
        "groups",
        "user_groups",
        "sessions",
        "messages",
    ];

    let tables_exist = check_tables_exist(&pool, &required_tables).await?;

    if !tables_exist {
        println!("Some tables missing. Running schema SQL to create tables...");
        pool.execute(combined_schema_sql.as_str())
            .await
            .context("Failed to execute schema SQL")?;
        println!("Schema SQL executed successfully.");
    } else {
        println!("All required tables exist.");
    }

    purge_stale_sessions(&pool).await?;
    ensure_admin_user(&pool).await?;
    Ok(pool)
}

// Sessions carry no activity window; anything older than 30 days goes.
async fn purge_stale_sessions(pool: &PgPool) -> Result<()> {
    let purged = sqlx::query("DELETE FROM sessions WHERE created_at < now() - INTERVAL '30 days'")
        .execute(pool)
        .await
        .context("Failed to purge stale sessions")?;

    println!("Purged {} stale session(s).", purged.rows_affected());
    Ok(())
}

pub async fn ensure_admin_user(pool: &PgPool) -> Result<()> {
    let admin_email = std::env::var("ADMIN_EMAIL").context("ADMIN_EMAIL must be set in .env")?;
    let admin_username =
        std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());

    let exists: (bool,) = sqlx::query_as(
        "SELECT EXISTS (
            SELECT 1 FROM users WHERE email = $1 OR username = $2
        )",
    )
    .bind(&admin_email)
    .bind(&admin_username)
    .fetch_one(pool)
    .await
    .context("Failed to query admin existence")?;

    if exists.0 {
        println!("Admin user already exists.");
        return Ok(());
    }

    let raw_password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();

    let salt = SaltString::generate(&mut OsRng);
    let hashed_password = Argon2::default()
        .hash_password(raw_password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;

    sqlx::query(
        "INSERT INTO users (username, email, password, status)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(&admin_username)
    .bind(&admin_email)
    .bind(hashed_password.to_string())
    .bind("admin")
    .execute(pool)
    .await
    .context("Failed to insert admin user")?;

    println!("Admin user created.");
    println!("Generated password for admin: {}", raw_password);

    if let Err(e) = send_admin_credentials_email(&admin_email, &raw_password).await {
        println!("⚠️  Could not send admin credentials email: {}", e);
    }

    Ok(())
}
