use super::session;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::notify;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Duration, SecondsFormat, Utc};
use common::requests::{ForgotPasswordRequest, ResetPasswordRequest, UpdatePasswordRequest};
use log::warn;
use rusqlite::{params, OptionalExtension};

const RESET_TTL_HOURS: i64 = 1;

/// `POST /api/auth/forgot` — creates a one-shot reset token and emails the
/// reset link. The response is the same whether or not the email is known,
/// and delivery failure is logged rather than surfaced.
pub async fn forgot(
    cfg: web::Data<Config>,
    payload: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    let email = payload.email.trim().to_lowercase();

    let user_id: Option<String> = conn
        .query_row(
            "SELECT id FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(user_id) = user_id {
        let token = db::new_id();
        let expires_at = (Utc::now() + Duration::hours(RESET_TTL_HOURS))
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        conn.execute(
            "INSERT INTO password_resets (token, user_id, expires_at, used, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![token, user_id, expires_at, db::now()],
        )?;

        let link = format!("{}/reset-password?token={}", cfg.site_url, token);
        let cfg = cfg.get_ref().clone();
        tokio::spawn(async move {
            let html = format!(
                "<p>Klik tautan berikut untuk mengatur ulang password Anda:</p>\
                 <p><a href=\"{}\">{}</a></p>\
                 <p>Tautan berlaku selama 1 jam.</p>",
                link, link
            );
            if let Err(e) =
                notify::send_email(&cfg, &email, "[SURATKU] Atur Ulang Password", &html).await
            {
                warn!("reset email to {} not sent: {}", email, e);
            }
        });
    }

    Ok(HttpResponse::Ok().body("Jika email terdaftar, tautan reset telah dikirim"))
}

/// `POST /api/auth/reset` — consumes a live reset token and stores the new
/// password hash.
pub async fn reset(
    cfg: web::Data<Config>,
    payload: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, ServiceError> {
    if payload.new_password.len() < 6 {
        return Err(ServiceError::Validation("Password minimal 6 karakter".to_string()));
    }

    let conn = db::open(&cfg.db_path)?;
    let user_id: Option<String> = conn
        .query_row(
            "SELECT user_id FROM password_resets
             WHERE token = ?1 AND used = 0 AND expires_at > ?2",
            params![payload.token, db::now()],
            |row| row.get(0),
        )
        .optional()?;
    let user_id = user_id.ok_or(ServiceError::NotFound("Reset token"))?;

    conn.execute(
        "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
        params![session::hash_password(&payload.new_password), db::now(), user_id],
    )?;
    conn.execute(
        "UPDATE password_resets SET used = 1 WHERE token = ?1",
        params![payload.token],
    )?;

    Ok(HttpResponse::Ok().body("Password berhasil diperbarui"))
}

/// `POST /api/auth/password` — authenticated password change.
pub async fn update(
    cfg: web::Data<Config>,
    req: HttpRequest,
    payload: web::Json<UpdatePasswordRequest>,
) -> Result<HttpResponse, ServiceError> {
    if payload.new_password.len() < 6 {
        return Err(ServiceError::Validation("Password minimal 6 karakter".to_string()));
    }

    let conn = db::open(&cfg.db_path)?;
    let user_id = session::current_user(&conn, &req)?;
    conn.execute(
        "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
        params![session::hash_password(&payload.new_password), db::now(), user_id],
    )?;

    Ok(HttpResponse::Ok().body("Password berhasil diperbarui"))
}
