use super::{detail_from_row, DETAIL_QUERY};
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::storage;
use actix_web::{web, HttpResponse};
use common::model::status::RequestStatus;
use regex::Regex;
use rusqlite::{params, OptionalExtension};

/// `GET /api/requests/track/{reference}` — public status lookup.
///
/// The reference is trimmed and uppercased before matching, so tracking is
/// effectively case-insensitive. Completed requests with a stored file get
/// a time-limited `download_url`.
pub async fn process(
    cfg: web::Data<Config>,
    reference: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let reference = reference.trim().to_uppercase();
    if reference.is_empty() {
        return Err(ServiceError::Validation(
            "Masukkan nomor pengajuan".to_string(),
        ));
    }
    let shape = Regex::new(r"^[A-Z]+-\d{6}-\d{4}$")
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    if !shape.is_match(&reference) {
        return Err(ServiceError::Validation(
            "Format nomor pengajuan tidak valid".to_string(),
        ));
    }

    let conn = db::open(&cfg.db_path)?;
    let sql = format!("{} WHERE lr.reference = ?1", DETAIL_QUERY);
    let detail = conn
        .query_row(&sql, params![reference], detail_from_row)
        .optional()?;

    let mut detail = match detail {
        Some(detail) => detail,
        None => return Err(ServiceError::NotFound("Request")),
    };

    if detail.request.status == RequestStatus::Completed {
        if let Some(file_url) = &detail.request.file_url {
            detail.download_url = Some(storage::sign_file_url(&cfg, file_url));
        }
    }

    Ok(HttpResponse::Ok().json(detail))
}
