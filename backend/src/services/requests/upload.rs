use super::detail_by_id;
use crate::change_feed::state::ChangesState;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use crate::storage;
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use log::info;
use rusqlite::params;

/// `POST /api/requests/{id}/file` — staff upload of the finished letter.
///
/// Accepts one multipart `file` part holding a PDF, stores it at the
/// deterministic path `surat/{REFERENCE}.pdf` (replacing any earlier file)
/// and records the public URL on the request.
pub async fn process(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    id: web::Path<String>,
    mut payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;
    let detail = detail_by_id(&conn, &id)?;

    let mut bytes: Vec<u8> = Vec::new();
    let mut seen_file = false;
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ServiceError::Validation(e.to_string()))?;
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .map(|name| name == "file")
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        seen_file = true;
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ServiceError::Validation(e.to_string()))?;
            bytes.extend_from_slice(&chunk);
        }
    }
    if !seen_file || bytes.is_empty() {
        return Err(ServiceError::Validation("File surat wajib diisi".to_string()));
    }
    if !bytes.starts_with(b"%PDF") {
        return Err(ServiceError::Validation(
            "File harus berformat PDF".to_string(),
        ));
    }

    let path = format!("surat/{}.pdf", detail.request.reference);
    let file_url = storage::save(&cfg, &path, &bytes)?;
    conn.execute(
        "UPDATE letter_requests SET file_url = ?1, updated_at = ?2 WHERE id = ?3",
        params![file_url, db::now(), detail.request.id],
    )?;

    info!(
        "letter file for {} stored ({} bytes)",
        detail.request.reference,
        bytes.len()
    );
    changes.publish("letter_requests");

    Ok(HttpResponse::Ok().json(detail_by_id(&conn, &id)?))
}
