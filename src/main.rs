use anyhow::{Context, Result};
use prodclass::config::AppConfig;
use prodclass::model::OnnxModel;
use prodclass::server;
use prodclass::service::ClassificationService;
use prodclass::util::init_tracing;
use std::path::PathBuf;
use std::sync::Arc;
use std::{env, process};
use tracing::info;

const USAGE: &str = "usage: ./prodclass [config file]";

fn get_args() -> Option<PathBuf> {
    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => None,
        2 if args[1] != "-h" && args[1] != "--help" => Some(PathBuf::from(&args[1])),
        _ => {
            println!("{USAGE}");
            process::exit(1);
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config_path = get_args();
    let config = AppConfig::load(config_path.as_deref())?;
    init_tracing(&config.logging.level);

    info!(
        model = %config.model.path.display(),
        image_size = config.model.image_size,
        layout = ?config.model.layout,
        "configuration loaded"
    );

    let service = ClassificationService::from_config(&config)?;

    // The server never starts without a usable model
    let model = OnnxModel::load(
        &config.model.path,
        config.model.image_size,
        config.model.layout,
        service.catalog(),
    )
    .context("cannot serve without a model")?;
    let service = service.with_model(Arc::new(model));

    server::run(&config.server, service)
        .await
        .context("HTTP server failed")
}
