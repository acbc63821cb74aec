//! Table definitions, one script per backend.
//!
//! Every statement is `IF NOT EXISTS`, so running a script against an
//! existing database is a no-op.

/// Schema for the embedded SQLite store.
pub const SQLITE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pokemon (
    encounter_id INTEGER PRIMARY KEY,
    spawnpoint_id TEXT NOT NULL,
    pokemon_id INTEGER NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    disappear_time TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pokemon_disappear_time ON pokemon(disappear_time);
CREATE INDEX IF NOT EXISTS idx_pokemon_position ON pokemon(latitude, longitude);

CREATE TABLE IF NOT EXISTS pokestop (
    pokestop_id TEXT PRIMARY KEY,
    enabled BOOLEAN NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    last_modified TIMESTAMP NOT NULL,
    lure_expiration TIMESTAMP,
    active_pokemon_id INTEGER
);

CREATE INDEX IF NOT EXISTS idx_pokestop_position ON pokestop(latitude, longitude);

CREATE TABLE IF NOT EXISTS gym (
    gym_id TEXT PRIMARY KEY,
    team_id INTEGER NOT NULL,
    guard_pokemon_id INTEGER NOT NULL,
    gym_points INTEGER NOT NULL,
    enabled BOOLEAN NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    last_modified TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_gym_position ON gym(latitude, longitude);

CREATE TABLE IF NOT EXISTS scannedlocation (
    scanned_id TEXT PRIMARY KEY,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    last_modified TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scannedlocation_last_modified ON scannedlocation(last_modified);
"#;

/// Schema for the networked PostgreSQL store.
pub const POSTGRES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pokemon (
    encounter_id BIGINT PRIMARY KEY,
    spawnpoint_id TEXT NOT NULL,
    pokemon_id BIGINT NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    disappear_time TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pokemon_disappear_time ON pokemon(disappear_time);
CREATE INDEX IF NOT EXISTS idx_pokemon_position ON pokemon(latitude, longitude);

CREATE TABLE IF NOT EXISTS pokestop (
    pokestop_id TEXT PRIMARY KEY,
    enabled BOOLEAN NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    last_modified TIMESTAMPTZ NOT NULL,
    lure_expiration TIMESTAMPTZ,
    active_pokemon_id BIGINT
);

CREATE INDEX IF NOT EXISTS idx_pokestop_position ON pokestop(latitude, longitude);

CREATE TABLE IF NOT EXISTS gym (
    gym_id TEXT PRIMARY KEY,
    team_id BIGINT NOT NULL,
    guard_pokemon_id BIGINT NOT NULL,
    gym_points BIGINT NOT NULL,
    enabled BOOLEAN NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    last_modified TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_gym_position ON gym(latitude, longitude);

CREATE TABLE IF NOT EXISTS scannedlocation (
    scanned_id TEXT PRIMARY KEY,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    last_modified TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scannedlocation_last_modified ON scannedlocation(last_modified);
"#;
