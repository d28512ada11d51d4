pub mod auth;
pub mod dashboard;
pub mod letter_types;
pub mod letters;
pub mod notify;
pub mod programs;
pub mod requests;
pub mod students;
