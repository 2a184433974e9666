mod config;
mod frame;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use config::ServerConfig;
use services::persistence::{self, JsonFileStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return;
        }
    };

    // A broken template is not fatal: new rooms start empty instead.
    let template = match config.template_path() {
        Some(path) => match persistence::read_room_file(&path).await {
            Ok(Some(room)) => {
                tracing::info!(path = %path.display(), walls = room.layout.walls.len(), "room template loaded");
                Some(room)
            }
            Ok(None) => {
                tracing::warn!(path = %path.display(), "room template not found");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "room template unreadable");
                None
            }
        },
        None => None,
    };

    let port = config.port;
    let store = Arc::new(JsonFileStore::new(config.data_dir.clone()));
    let state = state::AppState::new(config, store, template);

    let _persistence = persistence::spawn_persistence_task(state.clone());

    let app = routes::app(state);
    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%port, error = %e, "failed to bind");
            return;
        }
    };

    tracing::info!(%port, "room server listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server failed");
    }
}
