//! Table bindings for the persisted records.
//!
//! [`Record`] describes how a record maps onto its table: name, key
//! column, column order, and the values to bind for one row. The store
//! builds every upsert and select from this description.

use std::hash::Hash;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;

use crate::domain::{CoverageMark, EncounterId, PointOfInterest, Sighting, TeamStructure};

/// One bindable column value.
///
/// Nullable variants carry their SQL type even when empty, so PostgreSQL
/// sees a typed `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `TEXT`.
    Text(String),
    /// `BIGINT`, nullable.
    BigInt(Option<i64>),
    /// `DOUBLE PRECISION` / `REAL`.
    Double(f64),
    /// `BOOLEAN`.
    Bool(bool),
    /// `TIMESTAMPTZ` / `TIMESTAMP`, nullable.
    Timestamp(Option<DateTime<Utc>>),
}

/// A record stored in its own table, keyed by a single column.
pub trait Record:
    for<'r> sqlx::FromRow<'r, SqliteRow>
    + for<'r> sqlx::FromRow<'r, PgRow>
    + Send
    + Sync
    + Unpin
    + 'static
{
    /// Primary key type, used to collapse duplicates before writing.
    type Key: Eq + Hash + Send + Sync;

    /// Table name.
    const TABLE: &'static str;

    /// Primary key column. Must be the first entry of [`Record::COLUMNS`].
    const KEY_COLUMN: &'static str;

    /// All columns in bind order.
    const COLUMNS: &'static [&'static str];

    /// Returns the primary key.
    fn key(&self) -> Self::Key;

    /// Returns one value per entry of [`Record::COLUMNS`], in order.
    fn values(&self) -> Vec<Value>;
}

impl Record for Sighting {
    type Key = EncounterId;

    const TABLE: &'static str = "pokemon";
    const KEY_COLUMN: &'static str = "encounter_id";
    const COLUMNS: &'static [&'static str] = &[
        "encounter_id",
        "spawnpoint_id",
        "pokemon_id",
        "latitude",
        "longitude",
        "disappear_time",
    ];

    fn key(&self) -> EncounterId {
        self.encounter_id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::BigInt(Some(self.encounter_id.to_storage())),
            Value::Text(self.spawnpoint_id.clone()),
            Value::BigInt(Some(self.pokemon_id)),
            Value::Double(self.latitude),
            Value::Double(self.longitude),
            Value::Timestamp(Some(self.disappear_time)),
        ]
    }
}

impl Record for PointOfInterest {
    type Key = String;

    const TABLE: &'static str = "pokestop";
    const KEY_COLUMN: &'static str = "pokestop_id";
    const COLUMNS: &'static [&'static str] = &[
        "pokestop_id",
        "enabled",
        "latitude",
        "longitude",
        "last_modified",
        "lure_expiration",
        "active_pokemon_id",
    ];

    fn key(&self) -> String {
        self.pokestop_id.clone()
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.pokestop_id.clone()),
            Value::Bool(self.enabled),
            Value::Double(self.latitude),
            Value::Double(self.longitude),
            Value::Timestamp(Some(self.last_modified)),
            Value::Timestamp(self.lure_expiration),
            Value::BigInt(self.active_pokemon_id),
        ]
    }
}

impl Record for TeamStructure {
    type Key = String;

    const TABLE: &'static str = "gym";
    const KEY_COLUMN: &'static str = "gym_id";
    const COLUMNS: &'static [&'static str] = &[
        "gym_id",
        "team_id",
        "guard_pokemon_id",
        "gym_points",
        "enabled",
        "latitude",
        "longitude",
        "last_modified",
    ];

    fn key(&self) -> String {
        self.gym_id.clone()
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.gym_id.clone()),
            Value::BigInt(Some(self.team_id)),
            Value::BigInt(Some(self.guard_pokemon_id)),
            Value::BigInt(Some(self.gym_points)),
            Value::Bool(self.enabled),
            Value::Double(self.latitude),
            Value::Double(self.longitude),
            Value::Timestamp(Some(self.last_modified)),
        ]
    }
}

impl Record for CoverageMark {
    type Key = String;

    const TABLE: &'static str = "scannedlocation";
    const KEY_COLUMN: &'static str = "scanned_id";
    const COLUMNS: &'static [&'static str] =
        &["scanned_id", "latitude", "longitude", "last_modified"];

    fn key(&self) -> String {
        self.scanned_id.clone()
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.scanned_id.clone()),
            Value::Double(self.latitude),
            Value::Double(self.longitude),
            Value::Timestamp(Some(self.last_modified)),
        ]
    }
}

/// `INSERT INTO table (cols) ` prefix for `R`; the builder adds `VALUES`.
pub(crate) fn insert_head<R: Record>() -> String {
    format!("INSERT INTO {} ({}) ", R::TABLE, R::COLUMNS.join(", "))
}

/// ` ON CONFLICT (key) DO UPDATE SET ...` suffix overwriting every non-key
/// column of `R`.
pub(crate) fn upsert_tail<R: Record>() -> String {
    let assignments = R::COLUMNS
        .iter()
        .filter(|column| **column != R::KEY_COLUMN)
        .map(|column| format!("{column} = excluded.{column}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" ON CONFLICT ({}) DO UPDATE SET {assignments}", R::KEY_COLUMN)
}

/// `SELECT cols FROM table` for `R`.
pub(crate) fn select_head<R: Record>() -> String {
    format!("SELECT {} FROM {}", R::COLUMNS.join(", "), R::TABLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns_line_up<R: Record>(sample: &R) {
        assert_eq!(R::COLUMNS.first().copied(), Some(R::KEY_COLUMN));
        assert_eq!(sample.values().len(), R::COLUMNS.len());
    }

    #[test]
    fn every_record_binds_one_value_per_column() {
        let now = Utc::now();
        columns_line_up(&Sighting {
            encounter_id: EncounterId::new(1),
            spawnpoint_id: "sp".to_string(),
            pokemon_id: 3,
            latitude: 1.0,
            longitude: 2.0,
            disappear_time: now,
        });
        columns_line_up(&PointOfInterest {
            pokestop_id: "ps".to_string(),
            enabled: true,
            latitude: 1.0,
            longitude: 2.0,
            last_modified: now,
            lure_expiration: None,
            active_pokemon_id: None,
        });
        columns_line_up(&TeamStructure {
            gym_id: "g".to_string(),
            team_id: 0,
            guard_pokemon_id: 0,
            gym_points: 0,
            enabled: true,
            latitude: 1.0,
            longitude: 2.0,
            last_modified: now,
        });
        columns_line_up(&CoverageMark::at(1.0, 2.0, now));
    }

    #[test]
    fn upsert_tail_skips_key_column() {
        let tail = upsert_tail::<CoverageMark>();
        assert_eq!(
            tail,
            " ON CONFLICT (scanned_id) DO UPDATE SET latitude = excluded.latitude, \
             longitude = excluded.longitude, last_modified = excluded.last_modified"
        );
    }

    #[test]
    fn insert_head_lists_columns() {
        assert_eq!(
            insert_head::<CoverageMark>(),
            "INSERT INTO scannedlocation (scanned_id, latitude, longitude, last_modified) "
        );
    }
}
