//! # Letter Request Service Module
//!
//! The workflow core: submission, public tracking by reference number and
//! the staff-side lifecycle (status updates, file upload, deletion and CSV
//! export). Statuses advance along the fixed workflow
//! `Submitted -> Approved -> Processing -> Completed`.
//!
//! ## Registered routes
//!
//! * **`POST /`** — public submission; upserts the student by NIM,
//!   generates a reference number and creates a `Submitted` request.
//! * **`GET /track/{reference}`** — public status lookup, case-insensitive.
//! * **`GET /`** — staff list, newest first, with `status` and `q` filters.
//! * **`GET /mine`** — the authenticated student's own requests.
//! * **`GET /export`** — staff CSV export of the (filtered) list.
//! * **`PUT /{id}`** — staff status/notes update; stamps the milestone
//!   timestamp and sends the student a status email.
//! * **`POST /{id}/file`** — staff PDF upload for the finished letter.
//! * **`GET /{id}/letter`** / **`POST /{id}/letter`** — render the letter
//!   document (download, or store like an upload).
//! * **`DELETE /{id}`** — staff deletion.

pub mod reference;

mod delete;
mod list;
mod submit;
mod track;
mod update;
mod upload;

use crate::error::ServiceError;
use actix_web::web::{delete as del, get, post, put, scope};
use actix_web::Scope;
use common::model::letter_request::{LetterRequest, LetterRequestDetail};
use common::model::letter_type::LetterType;
use common::model::status::RequestStatus;
use common::model::student::Student;
use rusqlite::types::Type;

const API_PATH: &str = "/api/requests";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(submit::process))
        .route("", get().to(list::process))
        .route("/mine", get().to(list::mine))
        .route("/export", get().to(list::export))
        .route("/track/{reference}", get().to(track::process))
        .route("/{id}", put().to(update::process))
        .route("/{id}", del().to(delete::process))
        .route("/{id}/file", post().to(upload::process))
        .route("/{id}/letter", get().to(crate::services::letters::preview))
        .route("/{id}/letter", post().to(crate::services::letters::process))
}

/// Parses a status column, mapping unknown values onto a proper conversion
/// error instead of a panic.
pub fn status_from_sql(idx: usize, raw: String) -> rusqlite::Result<RequestStatus> {
    raw.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown status: {}", raw).into(),
        )
    })
}

/// Column list matching `request_from_row`.
pub const REQUEST_COLUMNS: &str = "lr.id, lr.reference, lr.student_id, lr.letter_type_id, \
     lr.purpose, lr.status, lr.admin_notes, lr.file_url, lr.processed_by, \
     lr.submitted_at, lr.approved_at, lr.processing_at, lr.completed_at, \
     lr.created_at, lr.updated_at";

pub fn request_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LetterRequest> {
    Ok(LetterRequest {
        id: row.get(0)?,
        reference: row.get(1)?,
        student_id: row.get(2)?,
        letter_type_id: row.get(3)?,
        purpose: row.get(4)?,
        status: status_from_sql(5, row.get(5)?)?,
        admin_notes: row.get(6)?,
        file_url: row.get(7)?,
        processed_by: row.get(8)?,
        submitted_at: row.get(9)?,
        approved_at: row.get(10)?,
        processing_at: row.get(11)?,
        completed_at: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

/// `SELECT`/`FROM` fragment shared by every joined detail query. Callers
/// append their own `WHERE`/`ORDER BY` clauses.
pub const DETAIL_QUERY: &str = "SELECT lr.id, lr.reference, lr.student_id, lr.letter_type_id, \
       lr.purpose, lr.status, lr.admin_notes, lr.file_url, lr.processed_by, \
       lr.submitted_at, lr.approved_at, lr.processing_at, lr.completed_at, \
       lr.created_at, lr.updated_at, \
       s.id, s.name, s.nim, s.program, s.email, s.phone, s.user_id, \
       s.created_at, s.updated_at, \
       lt.id, lt.code, lt.name, lt.description, lt.addressee, lt.template, \
       lt.is_active, lt.created_at, lt.updated_at \
 FROM letter_requests lr \
 LEFT JOIN students s ON s.id = lr.student_id \
 LEFT JOIN letter_types lt ON lt.id = lr.letter_type_id";

pub fn detail_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LetterRequestDetail> {
    let request = request_from_row(row)?;

    // The joins are LEFT: a missing side yields NULL in its id column.
    let student = match row.get::<_, Option<String>>(15)? {
        Some(id) => Some(Student {
            id,
            name: row.get(16)?,
            nim: row.get(17)?,
            program: row.get(18)?,
            email: row.get(19)?,
            phone: row.get(20)?,
            user_id: row.get(21)?,
            created_at: row.get(22)?,
            updated_at: row.get(23)?,
        }),
        None => None,
    };

    let letter_type = match row.get::<_, Option<String>>(24)? {
        Some(id) => Some(LetterType {
            id,
            code: row.get(25)?,
            name: row.get(26)?,
            description: row.get(27)?,
            addressee: row.get(28)?,
            template: row.get(29)?,
            is_active: row.get(30)?,
            created_at: row.get(31)?,
            updated_at: row.get(32)?,
        }),
        None => None,
    };

    Ok(LetterRequestDetail {
        request,
        student,
        letter_type,
        download_url: None,
    })
}

/// Loads one joined request by id.
pub fn detail_by_id(
    conn: &rusqlite::Connection,
    id: &str,
) -> Result<LetterRequestDetail, ServiceError> {
    use rusqlite::OptionalExtension;
    let sql = format!("{} WHERE lr.id = ?1", DETAIL_QUERY);
    conn.query_row(&sql, rusqlite::params![id], detail_from_row)
        .optional()?
        .ok_or(ServiceError::NotFound("Request"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_feed::state::ChangesState;
    use crate::config::Config;
    use crate::db;
    use crate::services::auth::session;
    use actix_web::{test, web, App};
    use common::requests::{SubmitRequest, SubmitResponse, UpdateRequest};
    use rusqlite::params;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::{mpsc, RwLock};

    struct Harness {
        cfg: Config,
        changes: ChangesState,
        // Keeps the database and storage dirs alive for the test's duration.
        _dir: TempDir,
    }

    fn harness() -> Harness {
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
        Harness {
            cfg,
            changes,
            _dir: dir,
        }
    }

    fn seed_letter_type(h: &Harness, active: bool) -> String {
        let conn = db::open(&h.cfg.db_path).unwrap();
        let id = db::new_id();
        conn.execute(
            "INSERT INTO letter_types (id, code, name, is_active, created_at, updated_at)
             VALUES (?1, 'SK-AKTIF', 'Surat Keterangan Aktif', ?2, ?3, ?3)",
            params![id, active, db::now()],
        )
        .unwrap();
        id
    }

    fn seed_staff_session(h: &Harness) -> String {
        let conn = db::open(&h.cfg.db_path).unwrap();
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

    fn submit_payload(letter_type_id: &str) -> SubmitRequest {
        SubmitRequest {
            name: "Budi Santoso".to_string(),
            nim: "12345678".to_string(),
            program: "Teknik Informatika".to_string(),
            email: "budi@example.com".to_string(),
            phone: "081234567890".to_string(),
            letter_type_id: letter_type_id.to_string(),
            purpose: "pengajuan beasiswa semester ini".to_string(),
        }
    }

    macro_rules! app {
        ($h:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($h.cfg.clone()))
                    .app_data(web::Data::new($h.changes.clone()))
                    .service(configure_routes()),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn submission_creates_student_and_tracked_request() {
        let h = harness();
        let letter_type_id = seed_letter_type(&h, true);
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/requests")
            .set_json(submit_payload(&letter_type_id))
            .to_request();
        let resp: SubmitResponse = test::call_and_read_body_json(&app, req).await;
        assert!(resp.reference.starts_with("SUK-"));

        // Tracking is case-insensitive on the reference.
        let uri = format!("/api/requests/track/{}", resp.reference.to_lowercase());
        let req = test::TestRequest::get().uri(&uri).to_request();
        let detail: common::model::letter_request::LetterRequestDetail =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(detail.request.status, RequestStatus::Submitted);
        assert_eq!(detail.student.unwrap().nim, "12345678");

        // A second submission with the same NIM reuses the student row.
        let req = test::TestRequest::post()
            .uri("/api/requests")
            .set_json(submit_payload(&letter_type_id))
            .to_request();
        let second: SubmitResponse = test::call_and_read_body_json(&app, req).await;
        assert_ne!(second.reference, resp.reference);

        let conn = db::open(&h.cfg.db_path).unwrap();
        let students: i64 = conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))
            .unwrap();
        assert_eq!(students, 1);
    }

    #[actix_web::test]
    async fn inactive_letter_type_rejects_submission() {
        let h = harness();
        let letter_type_id = seed_letter_type(&h, false);
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/requests")
            .set_json(submit_payload(&letter_type_id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn unknown_reference_tracks_to_not_found() {
        let h = harness();
        let app = app!(h);

        let req = test::TestRequest::get()
            .uri("/api/requests/track/SUK-209901-9999")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        // A string that cannot be a reference is a validation error, not a
        // lookup miss.
        let req = test::TestRequest::get()
            .uri("/api/requests/track/bukan-nomor")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn status_update_stamps_milestone_once() {
        let h = harness();
        let letter_type_id = seed_letter_type(&h, true);
        let token = seed_staff_session(&h);
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/requests")
            .set_json(submit_payload(&letter_type_id))
            .to_request();
        let submitted: SubmitResponse = test::call_and_read_body_json(&app, req).await;

        let conn = db::open(&h.cfg.db_path).unwrap();
        let id: String = conn
            .query_row(
                "SELECT id FROM letter_requests WHERE reference = ?1",
                params![submitted.reference],
                |row| row.get(0),
            )
            .unwrap();

        let uri = format!("/api/requests/{}", id);
        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(UpdateRequest {
                status: RequestStatus::Processing,
                admin_notes: Some("sedang dicetak".to_string()),
            })
            .to_request();
        let detail: LetterRequestDetail = test::call_and_read_body_json(&app, req).await;
        assert_eq!(detail.request.status, RequestStatus::Processing);
        let stamped = detail.request.processing_at.clone().unwrap();
        assert!(detail.request.processed_by.is_some());

        // A correction back and forth must not move the original stamp.
        for status in [RequestStatus::Submitted, RequestStatus::Processing] {
            let req = test::TestRequest::put()
                .uri(&uri)
                .insert_header(("Authorization", format!("Bearer {}", token)))
                .set_json(UpdateRequest {
                    status,
                    admin_notes: None,
                })
                .to_request();
            let _: LetterRequestDetail = test::call_and_read_body_json(&app, req).await;
        }
        let again: String = conn
            .query_row(
                "SELECT processing_at FROM letter_requests WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(again, stamped);
    }

    #[actix_web::test]
    async fn upload_stores_file_at_reference_derived_path() {
        let h = harness();
        let letter_type_id = seed_letter_type(&h, true);
        let token = seed_staff_session(&h);
        let app = app!(h);

        let req = test::TestRequest::post()
            .uri("/api/requests")
            .set_json(submit_payload(&letter_type_id))
            .to_request();
        let submitted: SubmitResponse = test::call_and_read_body_json(&app, req).await;

        let conn = db::open(&h.cfg.db_path).unwrap();
        let id: String = conn
            .query_row(
                "SELECT id FROM letter_requests WHERE reference = ?1",
                params![submitted.reference],
                |row| row.get(0),
            )
            .unwrap();

        let body = "--BOUNDARY\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"surat.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             %PDF-1.4 test\r\n\
             --BOUNDARY--\r\n"
            .to_string();
        let req = test::TestRequest::post()
            .uri(&format!("/api/requests/{}/file", id))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .insert_header((
                "Content-Type",
                "multipart/form-data; boundary=BOUNDARY",
            ))
            .set_payload(body)
            .to_request();
        let detail: LetterRequestDetail = test::call_and_read_body_json(&app, req).await;

        let expected = format!("/files/surat/{}.pdf", submitted.reference);
        assert_eq!(detail.request.file_url.as_deref(), Some(expected.as_str()));
        let stored = std::path::Path::new(&h.cfg.storage_root)
            .join(format!("surat/{}.pdf", submitted.reference));
        assert!(stored.exists());
    }

    #[actix_web::test]
    async fn staff_routes_require_a_session() {
        let h = harness();
        let app = app!(h);

        let req = test::TestRequest::get().uri("/api/requests").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }
}
