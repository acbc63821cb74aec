//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::SpeciesAllowList;
use crate::error::ScannerError;
use crate::persistence::RetryPolicy;

/// Which entity kinds the snapshot parser writes.
///
/// The coverage mark is always written and has no toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestToggles {
    /// Write wild creature sightings.
    pub sightings: bool,
    /// Write points of interest.
    pub points_of_interest: bool,
    /// Write team structures.
    pub team_structures: bool,
}

impl Default for IngestToggles {
    fn default() -> Self {
        Self {
            sightings: true,
            points_of_interest: true,
            team_structures: true,
        }
    }
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`ScannerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,

    /// Storage connection string. The scheme selects the backend:
    /// `sqlite:` for the embedded file store, `postgres:` for PostgreSQL.
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Per-kind ingestion switches.
    pub ingest: IngestToggles,

    /// Project coordinates to GCJ-02 on read.
    pub china_coordinates: bool,

    /// Species eligible for storage.
    pub allow_list: SpeciesAllowList,

    /// Forts are ingested once the scan is past this many steps of its
    /// first iteration.
    pub fort_warmup_steps: u64,

    /// Rows per upsert statement.
    pub upsert_batch_size: usize,

    /// Retry policy for transient storage contention.
    pub retry: RetryPolicy,

    /// Trailing window that counts as recent coverage.
    pub coverage_window: chrono::Duration,

    /// Emit logs as JSON lines instead of text.
    pub log_json: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database_url: "sqlite://pogom.db".to_string(),
            database_max_connections: 10,
            database_connect_timeout_secs: 5,
            ingest: IngestToggles::default(),
            china_coordinates: false,
            allow_list: SpeciesAllowList::default(),
            fort_warmup_steps: 50,
            upsert_batch_size: 120,
            retry: RetryPolicy::default(),
            coverage_window: chrono::Duration::minutes(15),
            log_json: false,
        }
    }
}

impl ScannerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Config`] if `LISTEN_ADDR` or
    /// `SPECIES_ALLOW_LIST` is set but cannot be parsed, or if
    /// `COVERAGE_WINDOW_MINUTES` is not a positive representable span.
    pub fn from_env() -> Result<Self, ScannerError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| ScannerError::Config(format!("LISTEN_ADDR: {e}")))?,
            Err(_) => defaults.listen_addr,
        };

        let database_url = std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let allow_list = match std::env::var("SPECIES_ALLOW_LIST") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| ScannerError::Config(format!("SPECIES_ALLOW_LIST: {e}")))?,
            Err(_) => defaults.allow_list,
        };

        let retry = RetryPolicy {
            max_attempts: parse_env("UPSERT_MAX_ATTEMPTS", defaults.retry.max_attempts).max(1),
            initial_backoff: Duration::from_millis(parse_env("UPSERT_INITIAL_BACKOFF_MS", 50)),
            max_backoff: Duration::from_millis(parse_env("UPSERT_MAX_BACKOFF_MS", 2_000)),
        };

        let coverage_window = coverage_window(parse_env("COVERAGE_WINDOW_MINUTES", 15))?;

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections: parse_env(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            database_connect_timeout_secs: parse_env(
                "DATABASE_CONNECT_TIMEOUT_SECS",
                defaults.database_connect_timeout_secs,
            ),
            ingest: IngestToggles {
                sightings: parse_env_bool("INGEST_SIGHTINGS", true),
                points_of_interest: parse_env_bool("INGEST_POINTS_OF_INTEREST", true),
                team_structures: parse_env_bool("INGEST_TEAM_STRUCTURES", true),
            },
            china_coordinates: parse_env_bool("CHINA_COORDINATES", false),
            allow_list,
            fort_warmup_steps: parse_env("FORT_WARMUP_STEPS", defaults.fort_warmup_steps),
            upsert_batch_size: parse_env("UPSERT_BATCH_SIZE", defaults.upsert_batch_size).max(1),
            retry,
            coverage_window,
            log_json: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

/// Builds the coverage window from a minute count.
fn coverage_window(minutes: i64) -> Result<chrono::Duration, ScannerError> {
    chrono::Duration::try_minutes(minutes)
        .filter(|window| *window > chrono::Duration::zero())
        .ok_or_else(|| {
            ScannerError::Config(format!(
                "COVERAGE_WINDOW_MINUTES: {minutes} is not a positive number of minutes"
            ))
        })
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
