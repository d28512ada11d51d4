mod change_feed;
mod config;
mod db;
mod error;
mod services;
mod storage;

use crate::change_feed::state::ChangesState;
use crate::config::Config;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let cfg = Config::load();

    if let Err(e) = db::init(&cfg.db_path) {
        eprintln!("database initialization failed: {}", e);
        return Err(std::io::Error::other(e.to_string()));
    }

    // Initialize change feed state
    let (tx, rx) = mpsc::channel(100);
    let changes_state = ChangesState {
        versions: Arc::new(RwLock::new(HashMap::new())),
        tx,
    };

    // Start change feed updater task
    let updater_state = changes_state.clone();
    tokio::spawn(async move {
        change_feed::state::start_change_feed(updater_state, rx).await;
    });

    let bind = (cfg.host.clone(), cfg.port);
    info!("Server running at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(cfg.clone()))
            .app_data(web::Data::new(changes_state.clone()))
            .service(services::auth::configure_routes())
            .service(services::requests::configure_routes())
            .service(services::letter_types::configure_routes())
            .service(services::students::configure_routes())
            .service(services::programs::configure_routes())
            .service(services::dashboard::configure_routes())
            .service(change_feed::configure_routes())
            .route("/files/{path:.*}", web::get().to(storage::process_download))
    })
    .bind(bind)?
    .run()
    .await
}
