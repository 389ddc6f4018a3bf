//! SQL schema for the roomwatch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Temperature readings are append-only and never expire.
-- (location, timestamp) is the natural key; re-inserts are ignored.
CREATE TABLE IF NOT EXISTS temperature_readings (
    location    TEXT    NOT NULL,
    timestamp   INTEGER NOT NULL,   -- seconds since the Unix epoch
    temperature REAL    NOT NULL,
    PRIMARY KEY (location, timestamp)
);

-- Motion readings live until their sync window is purged.
CREATE TABLE IF NOT EXISTS motion_readings (
    location       TEXT    NOT NULL,
    timestamp      INTEGER NOT NULL,
    movement_count INTEGER NOT NULL CHECK (movement_count >= 0),
    sync_window    INTEGER NOT NULL CHECK (sync_window > 0),
    PRIMARY KEY (location, timestamp)
);

CREATE INDEX IF NOT EXISTS motion_window_idx ON motion_readings(sync_window);

PRAGMA user_version = 1;
";
