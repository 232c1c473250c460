mod config;
mod db;
mod errors;
mod handlers;
mod ingest;
mod models;
mod reports;
mod utils;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;
use std::io;

use config::Settings;
use db::postgres::PgStore;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let settings = Settings::from_env().map_err(|err| startup_error("Invalid configuration", err))?;

    // Initialize the store once; every request borrows it through app data.
    let pool = db::create_pool(&settings.database_url)
        .await
        .map_err(|err| startup_error("Failed to connect to the database", err))?;
    db::init_schema(&pool)
        .await
        .map_err(|err| startup_error("Failed to create tables", err))?;
    let store = web::Data::new(PgStore::new(pool));

    let bind_address = settings.bind_address.clone();
    let settings = web::Data::new(settings);

    info!("Starting server at {}", bind_address);

    let app_store = store.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(app_store.clone())
            .app_data(settings.clone())
            .configure(handlers::configure::<PgStore>)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    store.close().await;
    info!("Database pool closed");
    Ok(())
}
