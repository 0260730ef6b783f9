use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;

use crate::routes::{current_user, reverse};
use crate::templating::{PageContext, Template};

const INDEX_USER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Home</title></head>
<body>
<nav>{{ nav }} <span class="inbox-badge">{% inbox_count %}</span></nav>
{% inbox_count as unread %}
<h1>Welcome back, {{ username }}</h1>
<p>You have {{ unread }} unread message(s).</p>
</body>
</html>
"#;

const INDEX_ANON_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Home</title></head>
<body>
<nav>{{ nav }} <span class="inbox-badge">{% inbox_count %}</span></nav>
<h1>Welcome</h1>
<p>Log in or register to start messaging.</p>
</body>
</html>
"#;

const ABOUT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>About</title></head>
<body>
<nav>{{ nav }} <span class="inbox-badge">{% inbox_count %}</span></nav>
<h1>About</h1>
<p>A small messaging site: private messages between registered users, with
group-wide announcements from the staff.</p>
</body>
</html>
"#;

const CONTACTS_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Contacts</title></head>
<body>
<nav>{{ nav }} <span class="inbox-badge">{% inbox_count %}</span></nav>
<h1>Contacts</h1>
<p>Reach the site staff at the admin address configured for this deployment.</p>
</body>
</html>
"#;

fn nav_links() -> String {
    ["home", "about", "contacts", "login", "register", "logout"]
        .iter()
        .map(|name| format!(r#"<a href="{}">{}</a>"#, reverse(name).unwrap_or("/"), name))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Resolves the viewer and seeds the render context (nav plus username for
/// signed-in visitors).
pub(crate) async fn page_context(
    req: &HttpRequest,
    pool: &PgPool,
) -> Result<PageContext, sqlx::Error> {
    let mut ctx = match current_user(req, pool).await? {
        Some(user) => {
            let mut ctx = PageContext::for_user(user.id);
            ctx.set("username", user.username);
            ctx
        }
        None => PageContext::anonymous(),
    };
    ctx.set("nav", nav_links());
    Ok(ctx)
}

pub(crate) async fn render_page(
    source: &str,
    mut ctx: PageContext,
    pool: &PgPool,
) -> HttpResponse {
    let template = match Template::compile(source) {
        Ok(template) => template,
        Err(e) => {
            log::error!("Page template failed to compile: {}", e);
            return HttpResponse::InternalServerError().body("Template error");
        }
    };

    match template.render(&mut ctx, pool).await {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(e) => {
            log::error!("Page failed to render: {:?}", e);
            HttpResponse::InternalServerError().body("Database error")
        }
    }
}

pub async fn index(req: HttpRequest, db_pool: web::Data<PgPool>) -> impl Responder {
    let ctx = match page_context(&req, &db_pool).await {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("Session lookup failed: {:?}", e);
            return HttpResponse::InternalServerError().body("Database error");
        }
    };

    let source = if ctx.user.is_some() {
        INDEX_USER_TEMPLATE
    } else {
        INDEX_ANON_TEMPLATE
    };
    render_page(source, ctx, &db_pool).await
}

pub async fn about(req: HttpRequest, db_pool: web::Data<PgPool>) -> impl Responder {
    match page_context(&req, &db_pool).await {
        Ok(ctx) => render_page(ABOUT_TEMPLATE, ctx, &db_pool).await,
        Err(e) => {
            log::error!("Session lookup failed: {:?}", e);
            HttpResponse::InternalServerError().body("Database error")
        }
    }
}

pub async fn contacts(req: HttpRequest, db_pool: web::Data<PgPool>) -> impl Responder {
    match page_context(&req, &db_pool).await {
        Ok(ctx) => render_page(CONTACTS_TEMPLATE, ctx, &db_pool).await,
        Err(e) => {
            log::error!("Session lookup failed: {:?}", e);
            HttpResponse::InternalServerError().body("Database error")
        }
    }
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").name("home").route(web::get().to(index)));
    cfg.service(web::resource("/about/").name("about").route(web::get().to(about)));
    cfg.service(
        web::resource("/contacts/")
            .name("contacts")
            .route(web::get().to(contacts)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_templates_compile() {
        for source in [
            INDEX_USER_TEMPLATE,
            INDEX_ANON_TEMPLATE,
            ABOUT_TEMPLATE,
            CONTACTS_TEMPLATE,
        ] {
            Template::compile(source).expect("page template should compile");
        }
    }

    #[test]
    fn nav_links_use_the_declared_paths() {
        let nav = nav_links();
        assert!(nav.contains(r#"href="/about/""#));
        assert!(nav.contains(r#"href="/login/""#));
    }
}
