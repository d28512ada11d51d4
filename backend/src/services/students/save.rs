use crate::change_feed::state::ChangesState;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use actix_web::{web, HttpRequest, HttpResponse};
use common::requests::SaveStudent;
use rusqlite::params;

/// `POST /api/students` — manual creation. NIM is unique; a clash is a 409.
pub async fn create(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    payload: web::Json<SaveStudent>,
) -> Result<HttpResponse, ServiceError> {
    payload.validate().map_err(ServiceError::Validation)?;
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let id = db::new_id();
    let now = db::now();
    conn.execute(
        "INSERT INTO students (id, name, nim, program, email, phone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            id,
            payload.name.trim(),
            payload.nim.trim(),
            payload.program.trim(),
            payload.email.trim(),
            payload.phone.trim(),
            now,
        ],
    )
    .map_err(map_duplicate_nim)?;

    changes.publish("students");
    let row = conn.query_row(
        &format!("SELECT {} FROM students WHERE id = ?1", super::COLUMNS),
        params![id],
        super::from_row,
    )?;
    Ok(HttpResponse::Ok().json(row))
}

/// `PUT /api/students/{id}` — manual correction of a student row.
pub async fn update(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    id: web::Path<String>,
    payload: web::Json<SaveStudent>,
) -> Result<HttpResponse, ServiceError> {
    payload.validate().map_err(ServiceError::Validation)?;
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let updated = conn
        .execute(
            "UPDATE students SET name = ?1, nim = ?2, program = ?3, email = ?4,
                 phone = ?5, updated_at = ?6 WHERE id = ?7",
            params![
                payload.name.trim(),
                payload.nim.trim(),
                payload.program.trim(),
                payload.email.trim(),
                payload.phone.trim(),
                db::now(),
                id.as_str(),
            ],
        )
        .map_err(map_duplicate_nim)?;
    if updated == 0 {
        return Err(ServiceError::NotFound("Student"));
    }

    changes.publish("students");
    let row = conn.query_row(
        &format!("SELECT {} FROM students WHERE id = ?1", super::COLUMNS),
        params![id.as_str()],
        super::from_row,
    )?;
    Ok(HttpResponse::Ok().json(row))
}

/// `DELETE /api/students/{id}` — refuses while the student still has
/// requests on file.
pub async fn delete(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let in_use: i64 = conn.query_row(
        "SELECT COUNT(*) FROM letter_requests WHERE student_id = ?1",
        params![id.as_str()],
        |row| row.get(0),
    )?;
    if in_use > 0 {
        return Err(ServiceError::Conflict(
            "Mahasiswa masih memiliki pengajuan".to_string(),
        ));
    }
    let removed = conn.execute("DELETE FROM students WHERE id = ?1", params![id.as_str()])?;
    if removed == 0 {
        return Err(ServiceError::NotFound("Student"));
    }

    changes.publish("students");
    Ok(HttpResponse::Ok().body("Data mahasiswa dihapus"))
}

fn map_duplicate_nim(e: rusqlite::Error) -> ServiceError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            ServiceError::Conflict("NIM sudah terdaftar".to_string())
        }
        _ => ServiceError::Database(e),
    }
}
