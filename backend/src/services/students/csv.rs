//! CSV import and export for student records, keyed by NIM.

use crate::change_feed::state::ChangesState;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use actix_web::{web, HttpRequest, HttpResponse};
use common::requests::ImportReport;
use log::warn;
use rusqlite::{params, OptionalExtension};

const HEADER: [&str; 5] = ["nim", "name", "program", "email", "phone"];

/// `GET /api/students/export`
pub async fn export(
    cfg: web::Data<Config>,
    req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let sql = format!("SELECT {} FROM students ORDER BY nim", super::COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], super::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(HEADER)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    for row in &rows {
        writer
            .write_record([
                row.nim.as_str(),
                row.name.as_str(),
                row.program.as_str(),
                row.email.as_str(),
                row.phone.as_str(),
            ])
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"students.csv\"",
        ))
        .body(bytes))
}

/// `POST /api/students/import` — CSV body, upsert by NIM. Rows without a
/// NIM or name are skipped.
pub async fn import(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let mut reader = csv::Reader::from_reader(body.as_ref());
    let mut report = ImportReport {
        imported: 0,
        skipped: 0,
    };

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping malformed CSV row: {}", e);
                report.skipped += 1;
                continue;
            }
        };
        let nim = record.get(0).unwrap_or("").trim();
        let name = record.get(1).unwrap_or("").trim();
        if nim.is_empty() || name.is_empty() {
            report.skipped += 1;
            continue;
        }
        let program = record.get(2).unwrap_or("").trim();
        let email = record.get(3).unwrap_or("").trim();
        let phone = record.get(4).unwrap_or("").trim();

        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM students WHERE nim = ?1",
                params![nim],
                |row| row.get(0),
            )
            .optional()?;
        let now = db::now();
        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE students SET name = ?1, program = ?2, email = ?3, phone = ?4,
                         updated_at = ?5 WHERE id = ?6",
                    params![name, program, email, phone, now, id],
                )?;
            }
            None => {
                conn.execute(
                    "INSERT INTO students
                         (id, name, nim, program, email, phone, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                    params![db::new_id(), name, nim, program, email, phone, now],
                )?;
            }
        }
        report.imported += 1;
    }

    if report.imported > 0 {
        changes.publish("students");
    }
    Ok(HttpResponse::Ok().json(report))
}
