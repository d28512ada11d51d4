use super::session;
use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use actix_web::{web, HttpRequest, HttpResponse};
use common::requests::UpdateProfileRequest;
use rusqlite::{params, OptionalExtension};

/// `PUT /api/auth/profile` — the calling admin updates their own display
/// name and login email. The email moves on both the staff profile and the
/// login account, so the next sign-in uses the new address.
pub async fn update(
    cfg: web::Data<Config>,
    req: HttpRequest,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ServiceError> {
    payload.validate().map_err(ServiceError::Validation)?;

    let conn = db::open(&cfg.db_path)?;
    let staff = session::require_staff(&conn, &req)?;

    let email = payload.email.trim().to_lowercase();
    let taken: Option<String> = conn
        .query_row(
            "SELECT id FROM users WHERE email = ?1 AND id != ?2",
            params![email, staff.user_id],
            |row| row.get(0),
        )
        .optional()?;
    if taken.is_some() {
        return Err(ServiceError::Conflict("Email sudah terdaftar".to_string()));
    }

    let now = db::now();
    conn.execute(
        "UPDATE users SET email = ?1, updated_at = ?2 WHERE id = ?3",
        params![email, now, staff.user_id],
    )?;
    conn.execute(
        "UPDATE staff_profiles SET name = ?1, email = ?2, updated_at = ?3 WHERE id = ?4",
        params![payload.name.trim(), email, now, staff.id],
    )?;

    let updated = session::require_staff(&conn, &req)?;
    Ok(HttpResponse::Ok().json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use common::model::staff::StaffProfile;
    use tempfile::TempDir;

    fn harness() -> (Config, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            db_path: dir.path().join("test.sqlite").to_str().unwrap().to_string(),
            storage_root: dir.path().join("storage").to_str().unwrap().to_string(),
            reference_prefix: "SUK".to_string(),
            signing_secret: "secret".to_string(),
            resend_api_key: None,
            site_url: "http://localhost".to_string(),
            fonts_dir: "./fonts".to_string(),
        };
        db::init(&cfg.db_path).unwrap();
        (cfg, dir)
    }

    fn seed_staff(cfg: &Config, email: &str) -> String {
        let conn = db::open(&cfg.db_path).unwrap();
        let user_id = db::new_id();
        let now = db::now();
        conn.execute(
            "INSERT INTO users (id, email, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![user_id, email, session::hash_password("rahasia"), now],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO staff_profiles
                 (id, user_id, name, email, role, is_active, created_at, updated_at)
             VALUES (?1, ?2, 'Admin', ?3, 'admin', 1, ?4, ?4)",
            params![db::new_id(), user_id, email, now],
        )
        .unwrap();
        session::issue_session(&conn, &user_id).unwrap()
    }

    #[actix_web::test]
    async fn profile_update_moves_name_and_login_email() {
        let (cfg, _dir) = harness();
        let token = seed_staff(&cfg, "admin@example.com");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(cfg.clone()))
                .service(super::super::configure_routes()),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/auth/profile")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(UpdateProfileRequest {
                name: "Kepala Bagian".to_string(),
                email: "Kabag@Example.com".to_string(),
            })
            .to_request();
        let profile: StaffProfile = test::call_and_read_body_json(&app, req).await;
        assert_eq!(profile.name, "Kepala Bagian");
        assert_eq!(profile.email, "kabag@example.com");

        let conn = db::open(&cfg.db_path).unwrap();
        let login_email: String = conn
            .query_row(
                "SELECT email FROM users WHERE id = ?1",
                params![profile.user_id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(login_email, "kabag@example.com");
    }

    #[actix_web::test]
    async fn profile_update_rejects_an_email_already_in_use() {
        let (cfg, _dir) = harness();
        let token = seed_staff(&cfg, "admin@example.com");
        seed_staff(&cfg, "other@example.com");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(cfg.clone()))
                .service(super::super::configure_routes()),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/auth/profile")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(UpdateProfileRequest {
                name: "Admin".to_string(),
                email: "other@example.com".to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);
    }
}
