//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the websocket channel, the room REST surface and the health probe
//! under one Axum router. If `STATIC_DIR` is configured, the front-end
//! assets are served as the fallback at `/`.

pub mod rooms;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        .route("/api/ws", get(ws::handle_ws))
        .route("/api/room/{room}", get(rooms::get_room))
        .route("/api/room/{room}/clear", post(rooms::clear_room))
        .route("/api/room/{room}/role", post(rooms::add_role))
        .route("/api/room/{room}/role/{role}", delete(rooms::remove_role))
        .route("/api/room/{room}/role/{role}/position", put(rooms::move_role))
        .route("/api/room/{room}/role/{role}/activity", put(rooms::set_activity))
        .route("/api/room/{room}/role/{role}/surroundings", get(rooms::role_surroundings))
        .route("/nearby_roles/{room}", get(rooms::nearby_roles))
        .route("/distance_chat/{room}", post(rooms::distance_chat))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => router,
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
