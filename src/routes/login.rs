use actix_web::cookie::Cookie;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::databases::accounts::logindb::get_user_by_username;
use crate::databases::accounts::sessiondb::create_session;
use crate::routes::pages::{page_context, render_page};

const LOGIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Log in</title></head>
<body>
<nav>{{ nav }} <span class="inbox-badge">{% inbox_count %}</span></nav>
<h1>Log in</h1>
<form method="post" action="/login/">
  <label>Username <input name="username"></label>
  <label>Password <input name="password" type="password"></label>
  <button type="submit">Log in</button>
</form>
</body>
</html>
"#;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login_form(req: HttpRequest, db_pool: web::Data<PgPool>) -> impl Responder {
    match page_context(&req, &db_pool).await {
        Ok(ctx) => render_page(LOGIN_TEMPLATE, ctx, &db_pool).await,
        Err(e) => {
            log::error!("Session lookup failed: {:?}", e);
            HttpResponse::InternalServerError().body("Database error")
        }
    }
}

pub async fn login(data: web::Json<LoginRequest>, db_pool: web::Data<PgPool>) -> impl Responder {
    let LoginRequest { username, password } = data.into_inner();

    match get_user_by_username(&db_pool, &username).await {
        Ok(Some(user)) => {
            let parsed_hash = match PasswordHash::new(&user.hashed_password) {
                Ok(hash) => hash,
                Err(_) => {
                    return HttpResponse::InternalServerError().body("Password hash parsing failed")
                }
            };

            if Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_err()
            {
                return HttpResponse::Unauthorized().body("Password does not match");
            }

            match create_session(&db_pool, user.id).await {
                Ok(token) => HttpResponse::Ok()
                    .cookie(
                        Cookie::build("session", token.to_string())
                            .path("/")
                            .http_only(true)
                            .finish(),
                    )
                    .json(json!({
                        "message": "Login successful",
                        "token": token.to_string(),
                        "user_id": user.id
                    })),
                Err(e) => {
                    log::error!("Session insert failed: {:?}", e);
                    HttpResponse::InternalServerError().body("Database error")
                }
            }
        }
        Ok(None) => HttpResponse::NotFound().body("No user found with that username"),
        Err(e) => {
            log::error!("DB query error: {:?}", e);
            HttpResponse::InternalServerError().body("Database error")
        }
    }
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/login/")
            .name("login")
            .route(web::get().to(login_form))
            .route(web::post().to(login)),
    );
}
