use super::detail_by_id;
use crate::change_feed::state::ChangesState;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use crate::services::notify;
use actix_web::{web, HttpRequest, HttpResponse};
use common::model::status::RequestStatus;
use common::requests::UpdateRequest;
use log::info;
use rusqlite::params;

/// `PUT /api/requests/{id}` — staff status and notes update.
///
/// Moving into a status stamps its milestone timestamp if it was never set
/// before; correcting a status backwards leaves earlier stamps untouched.
/// A transition into `Approved`, `Processing` or `Completed` also sends the
/// student a status email, best-effort.
pub async fn process(
    cfg: web::Data<Config>,
    changes: web::Data<ChangesState>,
    req: HttpRequest,
    id: web::Path<String>,
    payload: web::Json<UpdateRequest>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    let staff = session::require_staff(&conn, &req)?;

    let id = id.into_inner();
    let before = detail_by_id(&conn, &id)?;
    let now = db::now();

    conn.execute(
        "UPDATE letter_requests SET status = ?1, admin_notes = ?2, processed_by = ?3,
             updated_at = ?4 WHERE id = ?5",
        params![
            payload.status.as_str(),
            payload.admin_notes,
            staff.id,
            now,
            id,
        ],
    )?;
    if let Some(column) = milestone_column(payload.status) {
        let sql = format!(
            "UPDATE letter_requests SET {} = ?1 WHERE id = ?2 AND {} IS NULL",
            column, column
        );
        conn.execute(&sql, params![now, id])?;
    }

    let after = detail_by_id(&conn, &id)?;
    info!(
        "request {} moved {} -> {} by {}",
        after.request.reference, before.request.status, after.request.status, staff.email
    );
    changes.publish("letter_requests");

    if before.request.status != after.request.status {
        let cfg = cfg.get_ref().clone();
        let detail = after.clone();
        tokio::spawn(async move {
            notify::status_changed(&cfg, &detail).await;
        });
    }

    Ok(HttpResponse::Ok().json(after))
}

fn milestone_column(status: RequestStatus) -> Option<&'static str> {
    match status {
        RequestStatus::Submitted => None,
        RequestStatus::Approved => Some("approved_at"),
        RequestStatus::Processing => Some("processing_at"),
        RequestStatus::Completed => Some("completed_at"),
    }
}
