use std::path::Path;

use actix_files as fs;
use actix_web::{error, web, Error, HttpResponse, Responder};

use crate::lobby::LobbyStatus;
use crate::models::AppState;

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Chess game server")
}

/// Registry counters as JSON.
pub async fn stats(app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let stats = app_state
        .lobby
        .send(LobbyStatus)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: &Path) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/stats").route(web::get().to(stats)))
        .service(fs::Files::new("/static", static_dir).show_files_listing());
}
