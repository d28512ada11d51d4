//! Reference number generation.
//!
//! References look like `SUK-202608-0007`: a configurable prefix, the
//! year-month of submission and a counter that restarts every month. The
//! counter lives in the `reference_counters` table and is bumped on the
//! caller's connection; the submission handler runs the bump and the
//! request insert in one transaction, so an aborted insert never consumes
//! a number.

use crate::error::ServiceError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

pub fn next_reference(conn: &Connection, prefix: &str) -> Result<String, ServiceError> {
    let period = Utc::now().format("%Y%m").to_string();

    let current: Option<i64> = conn
        .query_row(
            "SELECT seq FROM reference_counters WHERE period = ?1",
            params![period],
            |row| row.get(0),
        )
        .optional()?;

    let next = current.unwrap_or(0) + 1;
    match current {
        Some(_) => {
            conn.execute(
                "UPDATE reference_counters SET seq = ?1 WHERE period = ?2",
                params![next, period],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO reference_counters (period, seq) VALUES (?1, ?2)",
                params![period, next],
            )?;
        }
    }

    Ok(format!("{}-{}-{:04}", prefix, period, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use tempfile::tempdir;

    #[test]
    fn references_are_sequential_within_a_month() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("refs.sqlite");
        let path = path.to_str().unwrap();
        db::init(path).unwrap();
        let conn = db::open(path).unwrap();

        let first = next_reference(&conn, "SUK").unwrap();
        let second = next_reference(&conn, "SUK").unwrap();

        let period = Utc::now().format("%Y%m").to_string();
        assert_eq!(first, format!("SUK-{}-0001", period));
        assert_eq!(second, format!("SUK-{}-0002", period));
    }

    #[test]
    fn prefix_is_configurable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("refs.sqlite");
        let path = path.to_str().unwrap();
        db::init(path).unwrap();
        let conn = db::open(path).unwrap();

        let reference = next_reference(&conn, "UNIV").unwrap();
        assert!(reference.starts_with("UNIV-"));
    }

    #[test]
    fn rolled_back_transaction_does_not_consume_a_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("refs.sqlite");
        let path = path.to_str().unwrap();
        db::init(path).unwrap();
        let mut conn = db::open(path).unwrap();

        let tx = conn.transaction().unwrap();
        let leaked = next_reference(&tx, "SUK").unwrap();
        drop(tx); // rollback

        let kept = next_reference(&conn, "SUK").unwrap();
        assert_eq!(leaked, kept);
    }
}
