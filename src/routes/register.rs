use actix_web::{web, HttpRequest, HttpResponse, Responder};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::databases::accounts::logindb::{insert_user, user_exists};
use crate::routes::pages::{page_context, render_page};

const REGISTER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Register</title></head>
<body>
<nav>{{ nav }} <span class="inbox-badge">{% inbox_count %}</span></nav>
<h1>Register</h1>
<form method="post" action="/register/">
  <label>Username <input name="username"></label>
  <label>Email <input name="email" type="email"></label>
  <label>Password <input name="password" type="password"></label>
  <button type="submit">Register</button>
</form>
</body>
</html>
"#;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub async fn register_form(req: HttpRequest, db_pool: web::Data<PgPool>) -> impl Responder {
    match page_context(&req, &db_pool).await {
        Ok(ctx) => render_page(REGISTER_TEMPLATE, ctx, &db_pool).await,
        Err(e) => {
            log::error!("Session lookup failed: {:?}", e);
            HttpResponse::InternalServerError().body("Database error")
        }
    }
}

pub async fn register(
    data: web::Json<RegisterRequest>,
    db_pool: web::Data<PgPool>,
) -> impl Responder {
    let user = data.into_inner();

    if user.username.is_empty() || user.email.is_empty() || user.password.is_empty() {
        return HttpResponse::BadRequest().body("Username, email and password required");
    }

    match user_exists(&db_pool, &user.username, &user.email).await {
        Ok(true) => return HttpResponse::Conflict().body("User already exists"),
        Err(e) => {
            log::error!("Error checking if user exists: {:?}", e);
            return HttpResponse::InternalServerError().body("DB query failed");
        }
        _ => {}
    }

    let salt = SaltString::generate(&mut OsRng);
    let hashed_password = match Argon2::default().hash_password(user.password.as_bytes(), &salt) {
        Ok(hash) => hash.to_string(),
        Err(_) => return HttpResponse::InternalServerError().body("Password hashing failed"),
    };

    match insert_user(&db_pool, &user.username, &user.email, &hashed_password).await {
        Ok(user_id) => HttpResponse::Ok().json(json!({ "user_id": user_id })),
        Err(e) => {
            log::error!("DB insert failed: {:?}", e);
            HttpResponse::InternalServerError().body("DB insert failed")
        }
    }
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/register/")
            .name("register")
            .route(web::get().to(register_form))
            .route(web::post().to(register)),
    );
}
