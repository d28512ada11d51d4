//! # Authentication Service Module
//!
//! Email+password authentication for both staff and student accounts.
//! Sessions are opaque bearer tokens stored server-side with a 7-day
//! expiry; protected routes resolve them through the guards in `session`.
//!
//! ## Registered routes
//!
//! * **`POST /login`** — verifies credentials and issues a session token.
//! * **`POST /register`** — staff self-registration: creates a login
//!   account and an active `admin` staff profile.
//! * **`POST /register-student`** — student self-registration: creates a
//!   login account and a linked student row (or links an existing unlinked
//!   row with the same NIM).
//! * **`POST /logout`** — deletes the caller's session.
//! * **`POST /forgot`** — creates a one-shot reset token and emails a reset
//!   link; delivery failure is logged, never surfaced.
//! * **`POST /reset`** — consumes a reset token and sets a new password.
//! * **`POST /password`** — authenticated password update.
//! * **`PUT /profile`** — authenticated update of the caller's own staff
//!   name and login email.

pub mod session;

mod login;
mod password;
mod profile;
mod register;

use actix_web::web::{post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/auth";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/login", post().to(login::process))
        .route("/logout", post().to(login::logout))
        .route("/register", post().to(register::staff))
        .route("/register-student", post().to(register::student))
        .route("/forgot", post().to(password::forgot))
        .route("/reset", post().to(password::reset))
        .route("/password", post().to(password::update))
        .route("/profile", put().to(profile::update))
}
