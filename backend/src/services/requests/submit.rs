use super::reference;
use crate::change_feed::state::ChangesState;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use actix_web::{web, HttpResponse};
use common::model::status::RequestStatus;
use common::requests::{SubmitRequest, SubmitResponse};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// `POST /api/requests` — public submission endpoint.
///
/// The student record is upserted by NIM so a returning student keeps one
/// row with their latest contact data. The request itself starts in
/// `Submitted` with a freshly generated reference number.
pub async fn process(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    payload: web::Json<SubmitRequest>,
) -> Result<HttpResponse, ServiceError> {
    payload.validate().map_err(ServiceError::Validation)?;

    let mut conn = db::open(&cfg.db_path)?;

    let active: Option<bool> = conn
        .query_row(
            "SELECT is_active FROM letter_types WHERE id = ?1",
            params![payload.letter_type_id],
            |row| row.get(0),
        )
        .optional()?;
    match active {
        None => return Err(ServiceError::NotFound("Letter type")),
        Some(false) => {
            return Err(ServiceError::Validation(
                "Jenis surat tidak tersedia".to_string(),
            ))
        }
        Some(true) => {}
    }

    let student_id = upsert_student(&conn, &payload)?;

    // Counter bump and insert commit together: an aborted insert does not
    // consume a reference number.
    let tx = conn.transaction()?;
    let reference = reference::next_reference(&tx, &cfg.reference_prefix)?;
    let now = db::now();
    tx.execute(
        "INSERT INTO letter_requests
             (id, reference, student_id, letter_type_id, purpose, status,
              submitted_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?7)",
        params![
            db::new_id(),
            reference,
            student_id,
            payload.letter_type_id,
            payload.purpose.trim(),
            RequestStatus::Submitted.as_str(),
            now,
        ],
    )?;
    tx.commit()?;

    info!("request {} submitted by nim {}", reference, payload.nim.trim());
    changes.publish("letter_requests");
    changes.publish("students");

    Ok(HttpResponse::Ok().json(SubmitResponse { reference }))
}

/// Updates the student row matching the NIM with the submitted contact data,
/// or inserts a new one. Returns the student id.
fn upsert_student(conn: &Connection, payload: &SubmitRequest) -> Result<String, ServiceError> {
    let nim = payload.nim.trim();
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM students WHERE nim = ?1",
            params![nim],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE students SET name = ?1, program = ?2, email = ?3, phone = ?4,
                     updated_at = ?5 WHERE id = ?6",
                params![
                    payload.name.trim(),
                    payload.program.trim(),
                    payload.email.trim(),
                    payload.phone.trim(),
                    db::now(),
                    id,
                ],
            )?;
            Ok(id)
        }
        None => {
            let id = db::new_id();
            let now = db::now();
            conn.execute(
                "INSERT INTO students (id, name, nim, program, email, phone, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    id,
                    payload.name.trim(),
                    nim,
                    payload.program.trim(),
                    payload.email.trim(),
                    payload.phone.trim(),
                    now,
                ],
            )?;
            Ok(id)
        }
    }
}
