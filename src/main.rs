use std::sync::Arc;

use actix::Actor;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};

use chess_server::config::ServerConfig;
use chess_server::lobby::Lobby;
use chess_server::models::AppState;
use chess_server::rating::{MemoryRatingStore, RatingUpdater};
use chess_server::session::SessionContext;
use chess_server::{oracle, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    let context = SessionContext {
        settings: config.game.clone(),
        ratings: Arc::new(RatingUpdater::new(Arc::new(MemoryRatingStore::default()))),
        oracle: oracle::from_config(&config.oracle),
    };
    let lobby = Lobby::new(context).start();
    let app_state = web::Data::new(AppState::new(lobby));

    let (host, port) = config.bind_address();
    let static_dir = config.static_dir.clone();
    info!("Starting chess server at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(|cfg| routes::configure_routes(cfg, &static_dir))
    })
    .bind((host, port))?
    .run()
    .await
}
