use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use sqlx::PgPool;

use postbox::routes::{configure_app, reverse, SITE_ROUTES};

// Never connects: handlers under test resolve anonymous requests without
// touching the database.
fn lazy_pool() -> PgPool {
    PgPool::connect_lazy("postgres://postgres@localhost/postbox_test").expect("lazy pool")
}

#[actix_web::test]
async fn every_site_route_dispatches_and_reverses() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(lazy_pool()))
            .configure(configure_app),
    )
    .await;

    for (name, path) in SITE_ROUTES {
        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_ne!(
            resp.status(),
            StatusCode::NOT_FOUND,
            "route '{}' ({}) did not dispatch",
            name,
            path
        );
        assert_eq!(reverse(name), Some(*path));
    }
}

#[actix_web::test]
async fn unknown_paths_are_not_found() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(lazy_pool()))
            .configure(configure_app),
    )
    .await;

    let req = test::TestRequest::get().uri("/no-such-page/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn anonymous_index_renders_the_empty_inbox_badge() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(lazy_pool()))
            .configure(configure_app),
    )
    .await;

    let req = test::TestRequest::get().uri("/").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let html = std::str::from_utf8(&body).expect("utf-8 page");

    // The badge degrades to the empty value for anonymous visitors.
    assert!(
        html.contains(r#"<span class="inbox-badge"></span>"#),
        "unexpected page body: {}",
        html
    );
}

#[actix_web::test]
async fn logout_without_a_session_is_unauthorized() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(lazy_pool()))
            .configure(configure_app),
    )
    .await;

    let req = test::TestRequest::get().uri("/logout/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn messaging_api_requires_a_session() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(lazy_pool()))
            .configure(configure_app),
    )
    .await;

    for path in [
        "/api/messages/inbox",
        "/api/messages/outbox",
        "/api/messages/trash",
        "/api/admin/messages",
        "/api/admin/messages/new",
    ] {
        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "path {}", path);
    }
}

#[actix_web::test]
async fn garbage_session_tokens_resolve_to_anonymous() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(lazy_pool()))
            .configure(configure_app),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(("Authorization", "Bearer not-a-uuid"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/")
        .cookie(actix_web::cookie::Cookie::new("session", "not-a-uuid"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
