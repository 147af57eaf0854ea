use std::{env, str::FromStr};

use actix_identity::IdentityMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{cookie::Key, middleware, web::Data, App, HttpServer};
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    SqlitePool,
};

mod booking;
mod db;
mod errors;
mod flightgen;
mod routes;
mod structs;
mod utils;

#[derive(Debug, Clone)]
pub struct AppState {
    db_pool: SqlitePool,
}

fn get_session_key() -> Key {
    match env::var("SESSION_KEY") {
        Ok(key_str) => Key::from(key_str.as_bytes()),
        Err(_) => {
            log::warn!("SESSION_KEY not set, using a generated key; sessions reset on restart");
            Key::generate()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://flightdeck.db".to_string());

    let opts = SqliteConnectOptions::from_str(&database_url)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .read_only(false)
        .busy_timeout(std::time::Duration::from_secs(5));

    let db_pool = SqlitePool::connect_with(opts)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    info!("Database migrated successfully");

    // Seed or top up the flight pool before accepting requests; a
    // generator failure must never block boot.
    if let Err(e) = flightgen::maintain_pool(&db_pool).await {
        log::warn!("Could not maintain flight pool: {}", e);
    }

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    info!("Starting HTTP server on http://{}/", bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .wrap(IdentityMiddleware::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                get_session_key(),
            ))
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
            .app_data(Data::new(AppState {
                db_pool: db_pool.clone(),
            }))
    })
    .bind(bind_addr)?
    .run()
    .await
}
