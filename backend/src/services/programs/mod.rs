//! # Study Program Catalog Module
//!
//! Small admin catalog feeding the program dropdown of the submission form.
//! Codes are uppercased on write and unique.

use crate::change_feed::state::ChangesState;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use actix_web::web::{delete as del, get, post, put, scope};
use actix_web::{web, HttpRequest, HttpResponse, Scope};
use common::model::program::StudyProgram;
use common::requests::{ImportReport, SaveStudyProgram};
use log::warn;
use rusqlite::{params, OptionalExtension};

const API_PATH: &str = "/api/programs";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(process))
        .route("/active", get().to(active))
        .route("", post().to(create))
        .route("/{id}", put().to(update))
        .route("/{id}", del().to(delete))
        .route("/export", get().to(export))
        .route("/import", post().to(import))
}

const COLUMNS: &str = "id, code, name, faculty, is_active, created_at, updated_at";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StudyProgram> {
    Ok(StudyProgram {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        faculty: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// `GET /api/programs` — staff list of the full catalog.
async fn process(cfg: web::Data<Config>, req: HttpRequest) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;
    let rows = fetch(&conn, false)?;
    Ok(HttpResponse::Ok().json(rows))
}

/// `GET /api/programs/active` — public list for the submission form.
async fn active(cfg: web::Data<Config>) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    let rows = fetch(&conn, true)?;
    Ok(HttpResponse::Ok().json(rows))
}

fn fetch(conn: &rusqlite::Connection, active_only: bool) -> Result<Vec<StudyProgram>, ServiceError> {
    let sql = if active_only {
        format!(
            "SELECT {} FROM study_programs WHERE is_active = 1 ORDER BY name",
            COLUMNS
        )
    } else {
        format!("SELECT {} FROM study_programs ORDER BY name", COLUMNS)
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<rusqlite::Result<Vec<StudyProgram>>>()?;
    Ok(rows)
}

async fn create(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    payload: web::Json<SaveStudyProgram>,
) -> Result<HttpResponse, ServiceError> {
    payload.validate().map_err(ServiceError::Validation)?;
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let id = db::new_id();
    let now = db::now();
    conn.execute(
        "INSERT INTO study_programs (id, code, name, faculty, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            id,
            payload.code.trim().to_uppercase(),
            payload.name.trim(),
            payload.faculty,
            payload.is_active,
            now,
        ],
    )
    .map_err(map_duplicate_code)?;

    changes.publish("study_programs");
    let row = conn.query_row(
        &format!("SELECT {} FROM study_programs WHERE id = ?1", COLUMNS),
        params![id],
        from_row,
    )?;
    Ok(HttpResponse::Ok().json(row))
}

async fn update(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    id: web::Path<String>,
    payload: web::Json<SaveStudyProgram>,
) -> Result<HttpResponse, ServiceError> {
    payload.validate().map_err(ServiceError::Validation)?;
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let updated = conn
        .execute(
            "UPDATE study_programs SET code = ?1, name = ?2, faculty = ?3, is_active = ?4,
                 updated_at = ?5 WHERE id = ?6",
            params![
                payload.code.trim().to_uppercase(),
                payload.name.trim(),
                payload.faculty,
                payload.is_active,
                db::now(),
                id.as_str(),
            ],
        )
        .map_err(map_duplicate_code)?;
    if updated == 0 {
        return Err(ServiceError::NotFound("Study program"));
    }

    changes.publish("study_programs");
    let row = conn.query_row(
        &format!("SELECT {} FROM study_programs WHERE id = ?1", COLUMNS),
        params![id.as_str()],
        from_row,
    )?;
    Ok(HttpResponse::Ok().json(row))
}

async fn delete(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let removed = conn.execute(
        "DELETE FROM study_programs WHERE id = ?1",
        params![id.as_str()],
    )?;
    if removed == 0 {
        return Err(ServiceError::NotFound("Study program"));
    }

    changes.publish("study_programs");
    Ok(HttpResponse::Ok().body("Program studi dihapus"))
}

/// `GET /api/programs/export`
async fn export(cfg: web::Data<Config>, req: HttpRequest) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;
    let rows = fetch(&conn, false)?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["code", "name", "faculty", "is_active"])
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    for row in &rows {
        writer
            .write_record([
                row.code.as_str(),
                row.name.as_str(),
                row.faculty.as_deref().unwrap_or(""),
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
            "attachment; filename=\"study_programs.csv\"",
        ))
        .body(bytes))
}

/// `POST /api/programs/import` — CSV body, upsert by code.
async fn import(
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
        let code = record.get(0).unwrap_or("").trim().to_uppercase();
        let name = record.get(1).unwrap_or("").trim().to_string();
        if code.is_empty() || name.is_empty() {
            report.skipped += 1;
            continue;
        }
        let faculty = record
            .get(2)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let is_active = !matches!(record.get(3).map(str::trim), Some("0") | Some("false"));

        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM study_programs WHERE code = ?1",
                params![code],
                |row| row.get(0),
            )
            .optional()?;
        let now = db::now();
        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE study_programs SET name = ?1, faculty = ?2, is_active = ?3,
                         updated_at = ?4 WHERE id = ?5",
                    params![name, faculty, is_active, now, id],
                )?;
            }
            None => {
                conn.execute(
                    "INSERT INTO study_programs
                         (id, code, name, faculty, is_active, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![db::new_id(), code, name, faculty, is_active, now],
                )?;
            }
        }
        report.imported += 1;
    }

    if report.imported > 0 {
        changes.publish("study_programs");
    }
    Ok(HttpResponse::Ok().json(report))
}

fn map_duplicate_code(e: rusqlite::Error) -> ServiceError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            ServiceError::Conflict("Kode program studi sudah dipakai".to_string())
        }
        _ => ServiceError::Database(e),
    }
}
