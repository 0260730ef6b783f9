use actix_web::{HttpRequest, HttpResponse};
use sqlx::PgPool;

use crate::databases::accounts::sessiondb::SessionUser;
use crate::routes::current_user;

pub mod messages;

/// Staff gate: 401 without a session, 403 for non-staff accounts.
pub async fn require_admin(req: &HttpRequest, pool: &PgPool) -> Result<SessionUser, HttpResponse> {
    match current_user(req, pool).await {
        Ok(Some(user)) if user.status == "admin" => Ok(user),
        Ok(Some(_)) => Err(HttpResponse::Forbidden().body("Admin access required")),
        Ok(None) => Err(HttpResponse::Unauthorized().body("Login required")),
        Err(e) => {
            log::error!("Session lookup failed: {:?}", e);
            Err(HttpResponse::InternalServerError().body("Database error"))
        }
    }
}
