mod config;
mod error;
mod model;
mod relay;
mod web;

use std::env;
use std::sync::Arc;

use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};

use config::{Config, API_KEY_VAR};
use model::{ApiKey, OpenAiModel};
use relay::ChatRelay;
use web::{cors, routes};

// App state structure
pub struct AppState {
    relay: ChatRelay,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting chat relay");

    let config = Config::from_env()?;

    // The key is resolved per request, so a missing one is only a warning here
    if env::var(API_KEY_VAR).map_or(true, |k| k.trim().is_empty()) {
        warn!("{} is not set; chat requests will fail until it is", API_KEY_VAR);
    }

    let llm = Arc::new(OpenAiModel::new(
        config.base_url.clone(),
        ApiKey::from_env(API_KEY_VAR),
    ));
    let app_state = Data::new(AppState {
        relay: ChatRelay::new(llm, config.model.clone(), config.persona.clone()),
    });

    info!("Listening on {}:{}", config.host, config.port);

    // Start web server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(cors::default_headers())
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
