use super::session;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use actix_web::{web, HttpResponse};
use common::requests::{SessionResponse, StaffRegisterRequest, StudentRegisterRequest};
use rusqlite::{params, Connection, OptionalExtension};

fn insert_user(conn: &Connection, email: &str, password: &str) -> Result<String, ServiceError> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(ServiceError::Conflict("Email sudah terdaftar".to_string()));
    }

    let id = db::new_id();
    let now = db::now();
    conn.execute(
        "INSERT INTO users (id, email, password_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, email, session::hash_password(password), now, now],
    )?;
    Ok(id)
}

/// `POST /api/auth/register` — staff self-registration: a login account
/// plus an active `admin` staff profile, signed in immediately.
pub async fn staff(
    cfg: web::Data<Config>,
    payload: web::Json<StaffRegisterRequest>,
) -> Result<HttpResponse, ServiceError> {
    let payload = payload.into_inner();
    if payload.name.trim().len() < 3 {
        return Err(ServiceError::Validation("Nama minimal 3 karakter".to_string()));
    }
    if payload.password.len() < 6 {
        return Err(ServiceError::Validation("Password minimal 6 karakter".to_string()));
    }

    let conn = db::open(&cfg.db_path)?;
    let email = payload.email.trim().to_lowercase();
    let user_id = insert_user(&conn, &email, &payload.password)?;

    let now = db::now();
    conn.execute(
        "INSERT INTO staff_profiles (id, user_id, name, email, role, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'admin', 1, ?5, ?6)",
        params![db::new_id(), user_id, payload.name.trim(), email, now, now],
    )?;

    let token = session::issue_session(&conn, &user_id)?;
    Ok(HttpResponse::Ok().json(SessionResponse {
        token,
        user_id,
        email,
        kind: "staff".to_string(),
    }))
}

/// `POST /api/auth/register-student` — student self-registration. If a
/// student row with the same NIM already exists without a linked account
/// it is claimed; a NIM already claimed by another account is a conflict.
pub async fn student(
    cfg: web::Data<Config>,
    payload: web::Json<StudentRegisterRequest>,
) -> Result<HttpResponse, ServiceError> {
    let payload = payload.into_inner();
    payload.validate().map_err(ServiceError::Validation)?;

    let conn = db::open(&cfg.db_path)?;
    let nim = payload.nim.trim();
    let email = payload.email.trim().to_lowercase();

    let existing: Option<(String, Option<String>)> = conn
        .query_row(
            "SELECT id, user_id FROM students WHERE nim = ?1",
            params![nim],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    if matches!(&existing, Some((_, Some(_)))) {
        return Err(ServiceError::Conflict("NIM sudah terdaftar".to_string()));
    }

    let user_id = insert_user(&conn, &email, &payload.password)?;
    let now = db::now();
    match existing {
        Some((student_id, None)) => {
            conn.execute(
                "UPDATE students SET name = ?1, program = ?2, email = ?3, phone = ?4,
                        user_id = ?5, updated_at = ?6 WHERE id = ?7",
                params![
                    payload.name.trim(),
                    payload.program.trim(),
                    email,
                    payload.phone.trim(),
                    user_id,
                    now,
                    student_id
                ],
            )?;
        }
        _ => {
            conn.execute(
                "INSERT INTO students (id, name, nim, program, email, phone, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    db::new_id(),
                    payload.name.trim(),
                    nim,
                    payload.program.trim(),
                    email,
                    payload.phone.trim(),
                    user_id,
                    now,
                    now
                ],
            )?;
        }
    }

    let token = session::issue_session(&conn, &user_id)?;
    Ok(HttpResponse::Ok().json(SessionResponse {
        token,
        user_id,
        email,
        kind: "student".to_string(),
    }))
}
