use super::{detail_from_row, DETAIL_QUERY};
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use actix_web::{web, HttpRequest, HttpResponse};
use common::model::letter_request::LetterRequestDetail;
use common::model::status::RequestStatus;
use rusqlite::params_from_iter;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Exact status filter.
    pub status: Option<String>,
    /// Free-text filter over reference, student name and NIM.
    pub q: Option<String>,
}

/// `GET /api/requests` — staff list, newest first.
pub async fn process(
    cfg: web::Data<Config>,
    req: HttpRequest,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;
    let rows = fetch(&conn, &query)?;
    Ok(HttpResponse::Ok().json(rows))
}

/// `GET /api/requests/mine` — the authenticated student's own requests.
pub async fn mine(
    cfg: web::Data<Config>,
    req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    let student = session::require_student(&conn, &req)?;

    let sql = format!(
        "{} WHERE lr.student_id = ?1 ORDER BY lr.created_at DESC",
        DETAIL_QUERY
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params![student.id], detail_from_row)?
        .collect::<rusqlite::Result<Vec<LetterRequestDetail>>>()?;

    Ok(HttpResponse::Ok().json(rows))
}

/// `GET /api/requests/export` — staff CSV export honoring the same filters
/// as the list.
pub async fn export(
    cfg: web::Data<Config>,
    req: HttpRequest,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;
    let rows = fetch(&conn, &query)?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "reference",
            "status",
            "student_name",
            "nim",
            "program",
            "letter_type",
            "purpose",
            "admin_notes",
            "submitted_at",
            "completed_at",
        ])
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    for row in &rows {
        let student = row.student.as_ref();
        writer
            .write_record([
                row.request.reference.as_str(),
                row.request.status.as_str(),
                student.map(|s| s.name.as_str()).unwrap_or(""),
                student.map(|s| s.nim.as_str()).unwrap_or(""),
                student.map(|s| s.program.as_str()).unwrap_or(""),
                row.letter_type
                    .as_ref()
                    .map(|t| t.name.as_str())
                    .unwrap_or(""),
                row.request.purpose.as_str(),
                row.request.admin_notes.as_deref().unwrap_or(""),
                row.request.submitted_at.as_str(),
                row.request.completed_at.as_deref().unwrap_or(""),
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
            "attachment; filename=\"letter_requests.csv\"",
        ))
        .body(bytes))
}

fn fetch(
    conn: &rusqlite::Connection,
    query: &ListQuery,
) -> Result<Vec<LetterRequestDetail>, ServiceError> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<String> = Vec::new();

    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: RequestStatus = status
            .parse()
            .map_err(|_| ServiceError::Validation("Status tidak dikenal".to_string()))?;
        clauses.push("lr.status = ?");
        args.push(status.as_str().to_string());
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        clauses.push("(lr.reference LIKE ? OR s.name LIKE ? OR s.nim LIKE ?)");
        let pattern = format!("%{}%", q);
        args.push(pattern.clone());
        args.push(pattern.clone());
        args.push(pattern);
    }

    let mut sql = DETAIL_QUERY.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY lr.created_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(args.iter()), detail_from_row)?
        .collect::<rusqlite::Result<Vec<LetterRequestDetail>>>()?;
    Ok(rows)
}
