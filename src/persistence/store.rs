//! sqlx-backed map store over SQLite or PostgreSQL.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;

use super::record::{Record, Value, insert_head, select_head, upsert_tail};
use super::retry::RetryPolicy;
use super::schema::{POSTGRES_SCHEMA, SQLITE_SCHEMA};
use crate::config::ScannerConfig;
use crate::domain::{BoundingBox, CoverageMark, PointOfInterest, Sighting, TeamStructure};
use crate::error::ScannerError;

/// Rows per upsert statement unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 120;

/// Expands `$body` once per backend with `$conn` bound to the concrete pool
/// and `$db` aliased to its database type.
macro_rules! with_pool {
    ($pool:expr, $conn:ident, $db:ident => $body:expr) => {
        match $pool {
            DbPool::Sqlite($conn) => {
                type $db = sqlx::Sqlite;
                $body
            }
            DbPool::Postgres($conn) => {
                type $db = sqlx::Postgres;
                $body
            }
        }
    };
}

/// Connection pool for the configured backend.
#[derive(Debug, Clone)]
pub enum DbPool {
    /// Embedded file (or in-memory) store.
    Sqlite(SqlitePool),
    /// Networked PostgreSQL store.
    Postgres(PgPool),
}

impl DbPool {
    /// Opens a pool for `url`; the scheme picks the backend.
    ///
    /// `sqlite:` files are created when missing. An in-memory SQLite URL
    /// gets a single long-lived connection so every query sees the same
    /// database.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Config`] for an unknown scheme and
    /// [`ScannerError::Persistence`] if the connection fails.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, ScannerError> {
        if url.starts_with("sqlite:") {
            let options = SqliteConnectOptions::from_str(url)?
                .create_if_missing(true)
                .busy_timeout(acquire_timeout);
            let pool_options = SqlitePoolOptions::new().acquire_timeout(acquire_timeout);
            let pool_options = if url.contains(":memory:") || url.contains("mode=memory") {
                pool_options
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
            } else {
                pool_options.max_connections(max_connections)
            };
            Ok(Self::Sqlite(pool_options.connect_with(options).await?))
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            let pool = PgPoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(acquire_timeout)
                .connect(url)
                .await?;
            Ok(Self::Postgres(pool))
        } else {
            Err(ScannerError::Config(format!(
                "unsupported database url scheme: {}",
                url.split(':').next().unwrap_or_default()
            )))
        }
    }

    /// Backend name for logs.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Most bind parameters one statement may carry on this backend.
    #[must_use]
    pub const fn max_bind_params(&self) -> usize {
        match self {
            Self::Sqlite(_) => 32_766,
            Self::Postgres(_) => 65_535,
        }
    }
}

/// Row filter appended to a select.
#[derive(Debug, Clone, Copy)]
enum Filter<'a> {
    /// `latitude` and `longitude` inside the box, edges included.
    Within(BoundingBox),
    /// `column > at`.
    After(&'static str, DateTime<Utc>),
    /// `column >= at`.
    NotBefore(&'static str, DateTime<Utc>),
    /// `column IN (ids)`. Skipped when `ids` is empty.
    AnyOf(&'static str, &'a [i64]),
}

/// Storage handle shared by ingestion and queries.
///
/// Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct MapStore {
    pool: DbPool,
    retry: RetryPolicy,
    batch_size: usize,
}

impl MapStore {
    /// Wraps an open pool with the default retry policy and batch size.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the batch size. Values below 1 are raised to 1.
    ///
    /// Each statement is further limited so its bind parameters fit the
    /// backend, see [`MapStore::batch_size_for`].
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Connects using the storage settings in `config`.
    ///
    /// # Errors
    ///
    /// See [`DbPool::connect`].
    pub async fn connect(config: &ScannerConfig) -> Result<Self, ScannerError> {
        let pool = DbPool::connect(
            &config.database_url,
            config.database_max_connections,
            Duration::from_secs(config.database_connect_timeout_secs),
        )
        .await?;
        tracing::info!(backend = pool.backend(), "storage connected");
        Ok(Self::new(pool)
            .with_retry(config.retry)
            .with_batch_size(config.upsert_batch_size))
    }

    /// Rows per statement for `R`: the configured batch size, lowered so
    /// `rows * columns` stays within [`DbPool::max_bind_params`].
    #[must_use]
    pub fn batch_size_for<R: Record>(&self) -> usize {
        let fits = self.pool.max_bind_params() / R::COLUMNS.len().max(1);
        self.batch_size.min(fits).max(1)
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Creates any missing tables and indexes.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] on database failure.
    pub async fn create_tables(&self) -> Result<(), ScannerError> {
        match &self.pool {
            DbPool::Sqlite(pool) => {
                sqlx::raw_sql(SQLITE_SCHEMA).execute(pool).await?;
            }
            DbPool::Postgres(pool) => {
                sqlx::raw_sql(POSTGRES_SCHEMA).execute(pool).await?;
            }
        }
        tracing::debug!(backend = self.pool.backend(), "schema ready");
        Ok(())
    }

    /// Inserts or overwrites every record, keyed by its primary key.
    ///
    /// Duplicate keys in `records` collapse to the last occurrence. Rows
    /// are written in statements of at most the configured batch size;
    /// each statement is retried on transient contention per the retry
    /// policy. Returns the number of distinct keys written.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] on a permanent failure and
    /// [`ScannerError::RetriesExhausted`] when contention outlives the
    /// policy. Batches written before the failure stay committed.
    pub async fn bulk_upsert<R: Record>(&self, records: &[R]) -> Result<u64, ScannerError> {
        let latest: HashMap<R::Key, usize> = records
            .iter()
            .enumerate()
            .map(|(idx, record)| (record.key(), idx))
            .collect();
        let unique: Vec<&R> = records
            .iter()
            .enumerate()
            .filter(|(idx, record)| latest.get(&record.key()) == Some(idx))
            .map(|(_, record)| record)
            .collect();

        let head = insert_head::<R>();
        let tail = upsert_tail::<R>();
        let total = unique.len();
        let batch_size = self.batch_size_for::<R>();

        for (n, batch) in unique.chunks(batch_size).enumerate() {
            let from = n * batch_size;
            tracing::debug!(
                table = R::TABLE,
                from,
                to = from + batch.len(),
                total,
                "upserting batch"
            );
            let (head, tail) = (head.as_str(), tail.as_str());
            self.retry
                .run(R::TABLE, move || self.execute_upsert(head, tail, batch))
                .await?;
        }

        Ok(u64::try_from(total).unwrap_or(u64::MAX))
    }

    async fn execute_upsert<R: Record>(
        &self,
        head: &str,
        tail: &str,
        batch: &[&R],
    ) -> Result<u64, sqlx::Error> {
        with_pool!(&self.pool, pool, Db => {
            let mut builder = QueryBuilder::<Db>::new(head);
            builder.push_values(batch.iter().copied(), |mut row, record| {
                for value in record.values() {
                    match value {
                        Value::Text(v) => row.push_bind(v),
                        Value::BigInt(v) => row.push_bind(v),
                        Value::Double(v) => row.push_bind(v),
                        Value::Bool(v) => row.push_bind(v),
                        Value::Timestamp(v) => row.push_bind(v),
                    };
                }
            });
            builder.push(tail);
            let done = builder.build().execute(pool).await?;
            Ok(done.rows_affected())
        })
    }

    async fn select<R: Record>(&self, filters: &[Filter<'_>]) -> Result<Vec<R>, ScannerError> {
        let rows = with_pool!(&self.pool, pool, Db => {
            let mut builder = QueryBuilder::<Db>::new(select_head::<R>());
            builder.push(" WHERE 1 = 1");
            for filter in filters {
                match *filter {
                    Filter::Within(bbox) => {
                        builder
                            .push(" AND latitude BETWEEN ")
                            .push_bind(bbox.sw_lat)
                            .push(" AND ")
                            .push_bind(bbox.ne_lat)
                            .push(" AND longitude BETWEEN ")
                            .push_bind(bbox.sw_lng)
                            .push(" AND ")
                            .push_bind(bbox.ne_lng);
                    }
                    Filter::After(column, at) => {
                        builder.push(format_args!(" AND {column} > ")).push_bind(at);
                    }
                    Filter::NotBefore(column, at) => {
                        builder.push(format_args!(" AND {column} >= ")).push_bind(at);
                    }
                    Filter::AnyOf(_, []) => {}
                    Filter::AnyOf(column, ids) => {
                        builder.push(format_args!(" AND {column} IN ("));
                        let mut list = builder.separated(", ");
                        for id in ids {
                            list.push_bind(*id);
                        }
                        list.push_unseparated(")");
                    }
                }
            }
            builder.push(format_args!(" ORDER BY {}", R::KEY_COLUMN));
            builder.build_query_as::<R>().fetch_all(pool).await?
        });
        Ok(rows)
    }

    /// Sightings still visible at `now`, optionally inside `bounds` and
    /// limited to `species` (an empty slice means every species).
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] on database failure.
    pub async fn sightings(
        &self,
        bounds: Option<BoundingBox>,
        species: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Vec<Sighting>, ScannerError> {
        let mut filters = vec![
            Filter::After("disappear_time", now),
            Filter::AnyOf("pokemon_id", species),
        ];
        filters.extend(bounds.map(Filter::Within));
        self.select(&filters).await
    }

    /// Points of interest, optionally inside `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] on database failure.
    pub async fn points_of_interest(
        &self,
        bounds: Option<BoundingBox>,
    ) -> Result<Vec<PointOfInterest>, ScannerError> {
        let filters: Vec<Filter<'_>> = bounds.map(Filter::Within).into_iter().collect();
        self.select(&filters).await
    }

    /// Team structures, optionally inside `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] on database failure.
    pub async fn team_structures(
        &self,
        bounds: Option<BoundingBox>,
    ) -> Result<Vec<TeamStructure>, ScannerError> {
        let filters: Vec<Filter<'_>> = bounds.map(Filter::Within).into_iter().collect();
        self.select(&filters).await
    }

    /// Coverage marks inside `bounds` scanned at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] on database failure.
    pub async fn coverage_since(
        &self,
        bounds: BoundingBox,
        since: DateTime<Utc>,
    ) -> Result<Vec<CoverageMark>, ScannerError> {
        self.select(&[
            Filter::NotBefore("last_modified", since),
            Filter::Within(bounds),
        ])
        .await
    }
}
