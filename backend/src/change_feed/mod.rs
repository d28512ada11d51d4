pub mod state;

use actix_web::web::{get, scope};
use actix_web::{web, HttpResponse, Responder, Scope};
use state::ChangesState;

const API_PATH: &str = "/api/changes";

/// `GET /api/changes` returns the current per-table version snapshot.
/// A client remembers the versions from its last poll and refetches the
/// tables whose numbers moved.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(process))
}

async fn process(state: web::Data<ChangesState>) -> impl Responder {
    let versions = state.versions.read().await;
    HttpResponse::Ok().json(&*versions)
}
