//! The user-facing JSON web server that listens for classification requests

use crate::config::ServerConfig;
use crate::service::ClassificationService;
use actix_web::{middleware, web, App, HttpServer};
use std::io;
use tracing::info;

pub mod protocol;
pub mod routes;

/// Register every route on an app or test service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::hello)
        .service(routes::predict)
        .service(routes::health);
}

/// Serve `service` until the process is told to stop
pub async fn run(config: &ServerConfig, service: ClassificationService) -> io::Result<()> {
    let service = web::Data::new(service);
    let limit = config.json_limit_bytes;

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(web::PayloadConfig::new(limit))
            .wrap(middleware::Logger::default())
            .configure(configure)
    });
    if config.workers > 0 {
        server = server.workers(config.workers);
    }

    info!(host = %config.host, port = config.port, "starting HTTP server");
    server.bind((config.host.as_str(), config.port))?.run().await
}
