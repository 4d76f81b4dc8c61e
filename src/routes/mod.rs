use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod generate;
pub mod health;
pub mod session;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = Router::new().nest("/api", session::router().merge(generate::router()));

    let base_router = health::router().merge(websocket::router());

    let docs_router = docs::router(state.clone());

    api_router
        .merge(base_router)
        .merge(docs_router)
        .with_state(state)
}
