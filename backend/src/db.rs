//! SQLite access: connection opening, schema creation and small shared
//! helpers. Handlers open a connection per operation from the configured
//! path; SQLite serializes writers and the workload is last-write-wins, so
//! no pool or application-level locking is needed.

use crate::error::ServiceError;
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;

pub fn open(path: &str) -> Result<Connection, ServiceError> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// Current instant as an RFC 3339 UTC string, the timestamp format of every
/// `*_at` column.
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Creates all tables if missing. Run once at startup.
pub fn init(path: &str) -> Result<(), ServiceError> {
    let conn = open(path)?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS sessions (
            token      TEXT PRIMARY KEY,
            user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS password_resets (
            token      TEXT PRIMARY KEY,
            user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at TEXT NOT NULL,
            used       INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS students (
            id         TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            nim        TEXT NOT NULL UNIQUE,
            program    TEXT NOT NULL,
            email      TEXT NOT NULL,
            phone      TEXT NOT NULL,
            user_id    TEXT REFERENCES users(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS staff_profiles (
            id         TEXT PRIMARY KEY,
            user_id    TEXT NOT NULL UNIQUE REFERENCES users(id),
            name       TEXT NOT NULL,
            email      TEXT NOT NULL,
            role       TEXT NOT NULL,
            is_active  INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS letter_types (
            id          TEXT PRIMARY KEY,
            code        TEXT NOT NULL UNIQUE,
            name        TEXT NOT NULL,
            description TEXT,
            addressee   TEXT,
            template    TEXT,
            is_active   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS study_programs (
            id         TEXT PRIMARY KEY,
            code       TEXT NOT NULL UNIQUE,
            name       TEXT NOT NULL,
            faculty    TEXT,
            is_active  INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS letter_requests (
            id             TEXT PRIMARY KEY,
            reference      TEXT NOT NULL UNIQUE,
            student_id     TEXT NOT NULL REFERENCES students(id),
            letter_type_id TEXT NOT NULL REFERENCES letter_types(id),
            purpose        TEXT NOT NULL,
            status         TEXT NOT NULL,
            admin_notes    TEXT,
            file_url       TEXT,
            processed_by   TEXT REFERENCES staff_profiles(id),
            submitted_at   TEXT NOT NULL,
            approved_at    TEXT,
            processing_at  TEXT,
            completed_at   TEXT,
            created_at     TEXT NOT NULL,
            updated_at     TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS reference_counters (
            period TEXT PRIMARY KEY,
            seq    INTEGER NOT NULL
        );",
    )?;
    Ok(())
}
