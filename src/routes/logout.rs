use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;

use crate::databases::accounts::sessiondb::delete_session;
use crate::routes::session_token;

pub async fn logout_user(req: HttpRequest, db_pool: web::Data<PgPool>) -> impl Responder {
    let token = match session_token(&req) {
        Some(token) => token,
        None => return HttpResponse::Unauthorized().body("Not logged in"),
    };

    match delete_session(&db_pool, token).await {
        Ok(true) => HttpResponse::Ok().json(json!({ "message": "Logged out" })),
        Ok(false) => HttpResponse::Unauthorized().body("Not logged in"),
        Err(e) => {
            log::error!("Session delete failed: {:?}", e);
            HttpResponse::InternalServerError().body("Database error")
        }
    }
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/logout/")
            .name("logout")
            .route(web::get().to(logout_user)),
    );
}
