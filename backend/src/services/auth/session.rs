//! Password digests, bearer-token sessions and the route guards built on
//! them. Every protected handler calls `require_staff` or `require_student`
//! with the request and an open connection before doing any work.

use crate::db;
use crate::error::ServiceError;
use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use chrono::{Duration, SecondsFormat, Utc};
use common::model::staff::{StaffProfile, StaffRole};
use common::model::student::Student;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

const SESSION_TTL_DAYS: i64 = 7;

/// Produces a `salt$hexdigest` password hash with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = db::new_id();
    format!("{}${}", salt, digest(&salt, password))
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"$");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Inserts a new session row and returns its bearer token.
pub fn issue_session(conn: &Connection, user_id: &str) -> Result<String, ServiceError> {
    let token = db::new_id();
    let expires_at = (Utc::now() + Duration::days(SESSION_TTL_DAYS))
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![token, user_id, expires_at, db::now()],
    )?;
    Ok(token)
}

pub fn delete_session(conn: &Connection, token: &str) -> Result<(), ServiceError> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Extracts the bearer token from the `Authorization` header.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}

/// Resolves the calling user from a live session, or `Unauthorized`.
pub fn current_user(conn: &Connection, req: &HttpRequest) -> Result<String, ServiceError> {
    let token = bearer_token(req).ok_or(ServiceError::Unauthorized)?;
    conn.query_row(
        "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > ?2",
        params![token, db::now()],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(ServiceError::Unauthorized)
}

/// Guard for admin routes: the session must belong to an active staff
/// profile.
pub fn require_staff(conn: &Connection, req: &HttpRequest) -> Result<StaffProfile, ServiceError> {
    let user_id = current_user(conn, req)?;
    conn.query_row(
        "SELECT id, user_id, name, email, role, is_active, created_at, updated_at
         FROM staff_profiles WHERE user_id = ?1 AND is_active = 1",
        params![user_id],
        staff_from_row,
    )
    .optional()?
    .ok_or(ServiceError::Unauthorized)
}

/// Guard for student routes: the session must be linked to a student row.
pub fn require_student(conn: &Connection, req: &HttpRequest) -> Result<Student, ServiceError> {
    let user_id = current_user(conn, req)?;
    conn.query_row(
        "SELECT id, name, nim, program, email, phone, user_id, created_at, updated_at
         FROM students WHERE user_id = ?1",
        params![user_id],
        student_from_row,
    )
    .optional()?
    .ok_or(ServiceError::Unauthorized)
}

pub fn staff_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StaffProfile> {
    Ok(StaffProfile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        role: StaffRole::parse(&row.get::<_, String>(4)?),
        is_active: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn student_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        nim: row.get(2)?,
        program: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        user_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
