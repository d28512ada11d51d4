//! # Letter Rendering Service Module
//!
//! Turns a request into the finished PDF. `process` builds the document
//! (templated or default layout), stores it at `surat/{REFERENCE}.pdf` and
//! records the file URL on the request; `preview` returns the bytes without
//! storing anything. Both are routed under the request scope as
//! `/{id}/letter`.

pub mod render;

use crate::change_feed::state::ChangesState;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use crate::services::requests::detail_by_id;
use crate::storage;
use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use rusqlite::params;

/// `POST /api/requests/{id}/letter` — staff generation of the letter file.
/// Overwrites any previously stored file for the same reference.
pub async fn process(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;
    let detail = detail_by_id(&conn, &id)?;

    let bytes = render::render_letter(&cfg, &detail)?;
    let path = format!("surat/{}.pdf", detail.request.reference);
    let file_url = storage::save(&cfg, &path, &bytes)?;
    conn.execute(
        "UPDATE letter_requests SET file_url = ?1, updated_at = ?2 WHERE id = ?3",
        params![file_url, db::now(), detail.request.id],
    )?;

    info!(
        "letter {} rendered ({} bytes)",
        detail.request.reference,
        bytes.len()
    );
    changes.publish("letter_requests");

    Ok(HttpResponse::Ok().json(detail_by_id(&conn, &id)?))
}

/// `GET /api/requests/{id}/letter` — staff download of the rendered PDF,
/// without touching the stored file.
pub async fn preview(
    cfg: web::Data<Config>,
    req: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;
    let detail = detail_by_id(&conn, &id)?;

    let bytes = render::render_letter(&cfg, &detail)?;
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            "Content-Disposition",
            format!(
                "attachment; filename=\"{}.pdf\"",
                detail.request.reference
            ),
        ))
        .body(bytes))
}
