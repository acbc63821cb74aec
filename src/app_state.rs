//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{IngestService, MapQueryService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Snapshot ingestion.
    pub ingest: Arc<IngestService>,
    /// Bounding-box reads.
    pub queries: Arc<MapQueryService>,
    /// Storage backend name, reported by `/health`.
    pub backend: &'static str,
}
