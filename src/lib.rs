//! # pogom-server
//!
//! Map-snapshot ingestion and bounding-box queries for a location-based
//! game scanner.
//!
//! An external polling loop posts each `GET_MAP_OBJECTS` snapshot it
//! fetches. The snapshot is turned into sightings, points of interest,
//! team structures and a coverage mark, which are upserted in batches
//! into SQLite or PostgreSQL. The map front end reads them back by
//! bounding box, optionally projected to GCJ-02.
//!
//! ## Architecture
//!
//! ```text
//! Scanner loop / map front end (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── IngestService, MapQueryService (service/)
//!     │
//!     ├── Records, snapshot shape, transforms (domain/)
//!     │
//!     └── MapStore: batched upsert + retry (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
