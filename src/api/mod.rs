//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Ingestion is mounted under `/api/v1`; `/raw_data` and `/health` sit at
//! the root where the map front end expects them.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::map::read_routes())
        .merge(handlers::system::routes())
}
