//! Service layer: snapshot ingestion and map queries.
//!
//! [`IngestService`] writes what the scanner sees; [`MapQueryService`]
//! reads it back for the map front end.

pub mod ingest_service;
pub mod query_service;

pub use ingest_service::{ExtractedRecords, IngestService, IngestSummary, ScanStep};
pub use query_service::MapQueryService;
