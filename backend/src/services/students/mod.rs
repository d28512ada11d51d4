//! # Student Record Module
//!
//! Staff-side management of the student master data. Rows are normally
//! created implicitly by submissions (upsert by NIM); these routes cover
//! manual corrections, bulk CSV exchange and cleanup.

mod csv;
mod save;

use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use actix_web::web::{delete as del, get, post, put, scope};
use actix_web::{web, HttpRequest, HttpResponse, Scope};
use common::model::student::Student;
use serde::Deserialize;

const API_PATH: &str = "/api/students";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(process))
        .route("", post().to(save::create))
        .route("/{id}", put().to(save::update))
        .route("/{id}", del().to(save::delete))
        .route("/export", get().to(csv::export))
        .route("/import", post().to(csv::import))
}

pub const COLUMNS: &str = "id, name, nim, program, email, phone, user_id, created_at, updated_at";

pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Student> {
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

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Free-text filter over name, NIM and program.
    pub q: Option<String>,
}

/// `GET /api/students` — staff list, filtered and ordered by name.
async fn process(
    cfg: web::Data<Config>,
    req: HttpRequest,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;

    let rows = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let pattern = format!("%{}%", q);
            let sql = format!(
                "SELECT {} FROM students
                  WHERE name LIKE ?1 OR nim LIKE ?1 OR program LIKE ?1
                  ORDER BY name",
                COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![pattern], from_row)?
                .collect::<rusqlite::Result<Vec<Student>>>()?;
            rows
        }
        None => {
            let sql = format!("SELECT {} FROM students ORDER BY name", COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], from_row)?
                .collect::<rusqlite::Result<Vec<Student>>>()?;
            rows
        }
    };

    Ok(HttpResponse::Ok().json(rows))
}
