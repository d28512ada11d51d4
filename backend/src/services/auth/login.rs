use super::session;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use actix_web::{web, HttpRequest, HttpResponse};
use common::requests::{LoginRequest, SessionResponse};
use rusqlite::{params, OptionalExtension};

/// `POST /api/auth/login` — verifies the credentials and issues a bearer
/// session token. The response says whether the account is a staff or a
/// student identity so the client can route to the right area.
pub async fn process(
    cfg: web::Data<Config>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    let payload = payload.into_inner();

    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE email = ?1",
            params![payload.email.trim().to_lowercase()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (user_id, password_hash) = row.ok_or(ServiceError::Unauthorized)?;
    if !session::verify_password(&password_hash, &payload.password) {
        return Err(ServiceError::Unauthorized);
    }

    let is_staff: Option<String> = conn
        .query_row(
            "SELECT id FROM staff_profiles WHERE user_id = ?1 AND is_active = 1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;

    let token = session::issue_session(&conn, &user_id)?;
    Ok(HttpResponse::Ok().json(SessionResponse {
        token,
        user_id,
        email: payload.email.trim().to_lowercase(),
        kind: if is_staff.is_some() { "staff" } else { "student" }.to_string(),
    }))
}

/// `POST /api/auth/logout` — deletes the caller's session if one is
/// presented; always succeeds.
pub async fn logout(
    cfg: web::Data<Config>,
    req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    if let Some(token) = session::bearer_token(&req) {
        let conn = db::open(&cfg.db_path)?;
        session::delete_session(&conn, &token)?;
    }
    Ok(HttpResponse::Ok().body("Signed out"))
}
