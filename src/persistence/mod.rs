//! Persistence layer: schema, batched upsert, and area queries.
//!
//! [`MapStore`] is the single storage handle. It is constructed once at
//! startup and handed to every component that reads or writes, over
//! either the embedded SQLite store or PostgreSQL.

pub mod record;
pub mod retry;
pub mod schema;
pub mod store;

pub use record::{Record, Value};
pub use retry::{RetryPolicy, is_transient};
pub use store::{DbPool, MapStore};
