//! # Letter Type Catalog Module
//!
//! Admin-managed catalog of requestable letter kinds, including the
//! optional `{{token}}` templates consumed by the renderer. Students only
//! ever see the active subset through `GET /active`.

mod csv;
mod save;

use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::services::auth::session;
use actix_web::web::{delete as del, get, post, put, scope};
use actix_web::{web, HttpRequest, HttpResponse, Scope};
use common::model::letter_type::LetterType;

const API_PATH: &str = "/api/letter-types";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(process))
        .route("/active", get().to(active))
        .route("", post().to(save::create))
        .route("/{id}", put().to(save::update))
        .route("/{id}", del().to(save::delete))
        .route("/export", get().to(csv::export))
        .route("/import", post().to(csv::import))
}

pub const COLUMNS: &str =
    "id, code, name, description, addressee, template, is_active, created_at, updated_at";

pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LetterType> {
    Ok(LetterType {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        addressee: row.get(4)?,
        template: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// `GET /api/letter-types` — staff list of the full catalog.
async fn process(
    cfg: web::Data<Config>,
    req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    session::require_staff(&conn, &req)?;
    let rows = fetch(&conn, false)?;
    Ok(HttpResponse::Ok().json(rows))
}

/// `GET /api/letter-types/active` — public list feeding the submission form.
async fn active(cfg: web::Data<Config>) -> Result<HttpResponse, ServiceError> {
    let conn = db::open(&cfg.db_path)?;
    let rows = fetch(&conn, true)?;
    Ok(HttpResponse::Ok().json(rows))
}

fn fetch(conn: &rusqlite::Connection, active_only: bool) -> Result<Vec<LetterType>, ServiceError> {
    let sql = if active_only {
        format!(
            "SELECT {} FROM letter_types WHERE is_active = 1 ORDER BY name",
            COLUMNS
        )
    } else {
        format!("SELECT {} FROM letter_types ORDER BY name", COLUMNS)
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<rusqlite::Result<Vec<LetterType>>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_feed::state::ChangesState;
    use actix_web::{test, App};
    use common::requests::ImportReport;
    use rusqlite::params;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::{mpsc, RwLock};

    fn harness() -> (Config, ChangesState, TempDir) {
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
        let (tx, _rx) = mpsc::channel(100);
        let changes = ChangesState {
            versions: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (cfg, changes, dir)
    }

    fn seed_staff_session(cfg: &Config) -> String {
        let conn = db::open(&cfg.db_path).unwrap();
        let user_id = db::new_id();
        let now = db::now();
        conn.execute(
            "INSERT INTO users (id, email, password_hash, created_at, updated_at)
             VALUES (?1, 'admin@example.com', ?2, ?3, ?3)",
            params![user_id, session::hash_password("rahasia"), now],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO staff_profiles
                 (id, user_id, name, email, role, is_active, created_at, updated_at)
             VALUES (?1, ?2, 'Admin', 'admin@example.com', 'admin', 1, ?3, ?3)",
            params![db::new_id(), user_id, now],
        )
        .unwrap();
        session::issue_session(&conn, &user_id).unwrap()
    }

    #[actix_web::test]
    async fn csv_import_export_round_trips_by_code() {
        let (cfg, changes, _dir) = harness();
        let token = seed_staff_session(&cfg);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(cfg.clone()))
                .app_data(web::Data::new(changes.clone()))
                .service(configure_routes()),
        )
        .await;

        let body = "code,name,description,addressee,template,is_active\n\
                    SKA,Surat Keterangan Aktif,Bukti mahasiswa aktif,Yth. Pimpinan,Kepada {{addressee}},1\n\
                    SKL,Surat Keterangan Lulus,,,,0\n\
                    ,Tanpa Kode,,,,1\n";
        let req = test::TestRequest::post()
            .uri("/api/letter-types/import")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .insert_header(("Content-Type", "text/csv"))
            .set_payload(body)
            .to_request();
        let report: ImportReport = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 1);

        let req = test::TestRequest::get()
            .uri("/api/letter-types/export")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let exported = test::call_and_read_body(&app, req).await;

        let mut reader = ::csv::Reader::from_reader(exported.as_ref());
        let rows: Vec<::csv::StringRecord> =
            reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "SKA");
        assert_eq!(&rows[0][3], "Yth. Pimpinan");
        assert_eq!(&rows[0][4], "Kepada {{addressee}}");
        assert_eq!(&rows[0][5], "1");
        assert_eq!(&rows[1][0], "SKL");
        assert_eq!(&rows[1][3], "");
        assert_eq!(&rows[1][4], "");
        assert_eq!(&rows[1][5], "0");

        // Re-importing the export updates in place instead of duplicating,
        // and the blank optional fields stay NULL rather than becoming
        // empty strings.
        let req = test::TestRequest::post()
            .uri("/api/letter-types/import")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .insert_header(("Content-Type", "text/csv"))
            .set_payload(exported)
            .to_request();
        let report: ImportReport = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report.imported, 2);

        let conn = db::open(&cfg.db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM letter_types", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
        let (template, addressee): (Option<String>, Option<String>) = conn
            .query_row(
                "SELECT template, addressee FROM letter_types WHERE code = 'SKL'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(template, None);
        assert_eq!(addressee, None);
    }
}
