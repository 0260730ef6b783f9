use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use postbox::databases;
use postbox::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let pool = match databases::setup_backend().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ Backend setup failed: {:?}", e);
            std::process::exit(1);
        }
    };

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    println!("🚀 Listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(pool.clone()))
            .configure(routes::configure_app)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
