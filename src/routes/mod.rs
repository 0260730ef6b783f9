use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::databases::accounts::sessiondb::{user_for_token, SessionUser};

pub mod admin;
pub mod login;
pub mod logout;
pub mod messages;
pub mod pages;
pub mod register;

/// The site's URL table as (symbolic name, path). Both columns are unique;
/// `reverse` resolves a name back to its path.
pub const SITE_ROUTES: &[(&str, &str)] = &[
    ("home", "/"),
    ("about", "/about/"),
    ("login", "/login/"),
    ("logout", "/logout/"),
    ("register", "/register/"),
    ("contacts", "/contacts/"),
];

pub fn reverse(name: &str) -> Option<&'static str> {
    SITE_ROUTES
        .iter()
        .find(|(route_name, _)| *route_name == name)
        .map(|(_, path)| *path)
}

/// Bearer header first, then the `session` cookie. Absent or unparsable
/// tokens resolve to no session without touching the database.
pub fn session_token(req: &HttpRequest) -> Option<Uuid> {
    let header_token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    let raw = header_token.or_else(|| req.cookie("session").map(|c| c.value().to_string()))?;
    Uuid::parse_str(raw.trim()).ok()
}

pub async fn current_user(
    req: &HttpRequest,
    pool: &PgPool,
) -> Result<Option<SessionUser>, sqlx::Error> {
    match session_token(req) {
        Some(token) => user_for_token(pool, token).await,
        None => Ok(None),
    }
}

pub async fn require_user(req: &HttpRequest, pool: &PgPool) -> Result<SessionUser, HttpResponse> {
    match current_user(req, pool).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(HttpResponse::Unauthorized().body("Login required")),
        Err(e) => {
            log::error!("Session lookup failed: {:?}", e);
            Err(HttpResponse::InternalServerError().body("Database error"))
        }
    }
}

/// Registers every route module. Shared by main and the integration tests.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    pages::init(cfg);
    register::init(cfg);
    login::init(cfg);
    logout::init(cfg);
    messages::init(cfg);
    admin::messages::init(cfg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn site_route_paths_and_names_are_unique() {
        let names: HashSet<_> = SITE_ROUTES.iter().map(|(name, _)| *name).collect();
        let paths: HashSet<_> = SITE_ROUTES.iter().map(|(_, path)| *path).collect();
        assert_eq!(names.len(), SITE_ROUTES.len());
        assert_eq!(paths.len(), SITE_ROUTES.len());
    }

    #[test]
    fn reverse_resolves_every_declared_name() {
        assert_eq!(reverse("home"), Some("/"));
        assert_eq!(reverse("about"), Some("/about/"));
        assert_eq!(reverse("login"), Some("/login/"));
        assert_eq!(reverse("logout"), Some("/logout/"));
        assert_eq!(reverse("register"), Some("/register/"));
        assert_eq!(reverse("contacts"), Some("/contacts/"));
        assert_eq!(reverse("missing"), None);
    }
}
