use crate::change_feed::state::ChangesState;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use actix_web::{web, HttpRequest, HttpResponse};
use common::requests::SaveLetterType;
use rusqlite::{params, Connection};

/// `POST /api/letter-types` — creates a catalog entry. Codes are unique;
/// a clash is a 409.
pub async fn create(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    payload: web::Json<SaveLetterType>,
) -> Result<HttpResponse, ServiceError> {
    payload.validate().map_err(ServiceError::Validation)?;
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let id = db::new_id();
    let now = db::now();
    conn.execute(
        "INSERT INTO letter_types
             (id, code, name, description, addressee, template, is_active,
              created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            id,
            payload.code.trim(),
            payload.name.trim(),
            payload.description,
            payload.addressee,
            payload.template,
            payload.is_active,
            now,
        ],
    )
    .map_err(map_duplicate_code)?;

    changes.publish("letter_types");
    let row = conn.query_row(
        &format!("SELECT {} FROM letter_types WHERE id = ?1", super::COLUMNS),
        params![id],
        super::from_row,
    )?;
    Ok(HttpResponse::Ok().json(row))
}

/// `PUT /api/letter-types/{id}` — full update of a catalog entry.
pub async fn update(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    id: web::Path<String>,
    payload: web::Json<SaveLetterType>,
) -> Result<HttpResponse, ServiceError> {
    payload.validate().map_err(ServiceError::Validation)?;
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let updated = conn
        .execute(
            "UPDATE letter_types SET code = ?1, name = ?2, description = ?3,
                 addressee = ?4, template = ?5, is_active = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                payload.code.trim(),
                payload.name.trim(),
                payload.description,
                payload.addressee,
                payload.template,
                payload.is_active,
                db::now(),
                id.as_str(),
            ],
        )
        .map_err(map_duplicate_code)?;
    if updated == 0 {
        return Err(ServiceError::NotFound("Letter type"));
    }

    changes.publish("letter_types");
    let row = conn.query_row(
        &format!("SELECT {} FROM letter_types WHERE id = ?1", super::COLUMNS),
        params![id.as_str()],
        super::from_row,
    )?;
    Ok(HttpResponse::Ok().json(row))
}

/// `DELETE /api/letter-types/{id}` — refuses while requests still point at
/// the type, to keep the history joinable.
pub async fn delete(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let in_use = count_requests(&conn, &id)?;
    if in_use > 0 {
        return Err(ServiceError::Conflict(
            "Jenis surat masih dipakai oleh pengajuan".to_string(),
        ));
    }
    let removed = conn.execute(
        "DELETE FROM letter_types WHERE id = ?1",
        params![id.as_str()],
    )?;
    if removed == 0 {
        return Err(ServiceError::NotFound("Letter type"));
    }

    changes.publish("letter_types");
    Ok(HttpResponse::Ok().body("Jenis surat dihapus"))
}

fn count_requests(conn: &Connection, id: &str) -> Result<i64, ServiceError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM letter_requests WHERE letter_type_id = ?1",
        params![id],
        |row| row.get(0),
    )?)
}

fn map_duplicate_code(e: rusqlite::Error) -> ServiceError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            ServiceError::Conflict("Kode jenis surat sudah dipakai".to_string())
        }
        _ => ServiceError::Database(e),
    }
}
