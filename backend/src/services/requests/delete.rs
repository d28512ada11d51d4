use crate::change_feed::state::ChangesState;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use rusqlite::params;

/// `DELETE /api/requests/{id}` — staff deletion. The stored letter file, if
/// any, is left in place; storage paths are reference-scoped and a later
/// re-submission gets a new reference.
pub async fn process(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    let staff = session::require_staff(&conn, &req)?;

    let removed = conn.execute(
        "DELETE FROM letter_requests WHERE id = ?1",
        params![id.as_str()],
    )?;
    if removed == 0 {
        return Err(ServiceError::NotFound("Request"));
    }

    info!("request {} deleted by {}", id, staff.email);
    changes.publish("letter_requests");
    Ok(HttpResponse::Ok().body("Pengajuan dihapus"))
}
