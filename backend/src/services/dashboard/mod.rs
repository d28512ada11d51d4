//! # Dashboard Module
//!
//! One staff endpoint aggregating the numbers the admin landing page shows:
//! request totals per status, the student count and the five most recent
//! requests.

use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use crate::services::requests::{detail_from_row, DETAIL_QUERY};
use actix_web::web::{get, scope};
use actix_web::{web, HttpRequest, HttpResponse, Scope};
use common::model::letter_request::LetterRequestDetail;
use common::model::status::WORKFLOW;
use rusqlite::params;
use serde::Serialize;
use std::collections::HashMap;

const API_PATH: &str = "/api/dashboard";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(process))
}

#[derive(Debug, Serialize)]
struct DashboardStats {
    total_requests: i64,
    /// Request count per status, keyed by the wire status name.
    by_status: HashMap<&'static str, i64>,
    total_students: i64,
    recent: Vec<LetterRequestDetail>,
}

/// `GET /api/dashboard`
async fn process(cfg: web::Data<Config>, req: HttpRequest) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let total_requests: i64 =
        conn.query_row("SELECT COUNT(*) FROM letter_requests", [], |row| row.get(0))?;
    let total_students: i64 =
        conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;

    let mut by_status = HashMap::new();
    for status in WORKFLOW {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM letter_requests WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        by_status.insert(status.as_str(), count);
    }

    let sql = format!("{} ORDER BY lr.created_at DESC LIMIT 5", DETAIL_QUERY);
    let mut stmt = conn.prepare(&sql)?;
    let recent = stmt
        .query_map([], detail_from_row)?
        .collect::<rusqlite::Result<Vec<LetterRequestDetail>>>()?;

    Ok(HttpResponse::Ok().json(DashboardStats {
        total_requests,
        by_status,
        total_students,
        recent,
    }))
}
