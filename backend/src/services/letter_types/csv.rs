//! CSV import and export for the letter type catalog.
//!
//! The natural key is `code`: importing a row whose code already exists
//! updates that entry, anything else inserts. Rows missing code or name are
//! counted as skipped, never abort the import.

use crate::change_feed::state::ChangesState;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use actix_web::{web, HttpRequest, HttpResponse};
use common::requests::ImportReport;
use log::warn;
use rusqlite::{params, OptionalExtension};

const HEADER: [&str; 6] = ["code", "name", "description", "addressee", "template", "is_active"];

/// `GET /api/letter-types/export`
pub async fn export(
    cfg: web::Data<Config>,
    req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let sql = format!("SELECT {} FROM letter_types ORDER BY code", super::COLUMNS);
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
                row.code.as_str(),
                row.name.as_str(),
                row.description.as_deref().unwrap_or(""),
                row.addressee.as_deref().unwrap_or(""),
                row.template.as_deref().unwrap_or(""),
                if row.is_active { "1" } else { "0" },
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
            "attachment; filename=\"letter_types.csv\"",
        ))
        .body(bytes))
}

/// `POST /api/letter-types/import` — CSV body, upsert by code.
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
        let code = record.get(0).unwrap_or("").trim();
        let name = record.get(1).unwrap_or("").trim();
        if code.is_empty() || name.is_empty() {
            report.skipped += 1;
            continue;
        }
        let description = non_empty(record.get(2));
        let addressee = non_empty(record.get(3));
        let template = non_empty(record.get(4));
        let is_active = !matches!(record.get(5).map(str::trim), Some("0") | Some("false"));

        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM letter_types WHERE code = ?1",
                params![code],
                |row| row.get(0),
            )
            .optional()?;
        let now = db::now();
        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE letter_types SET name = ?1, description = ?2, addressee = ?3,
                         template = ?4, is_active = ?5, updated_at = ?6 WHERE id = ?7",
                    params![name, description, addressee, template, is_active, now, id],
                )?;
            }
            None => {
                conn.execute(
                    "INSERT INTO letter_types
                         (id, code, name, description, addressee, template, is_active,
                          created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                    params![db::new_id(), code, name, description, addressee, template, is_active, now],
                )?;
            }
        }
        report.imported += 1;
    }

    if report.imported > 0 {
        changes.publish("letter_types");
    }
    Ok(HttpResponse::Ok().json(report))
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
