use serde::{Deserialize, Serialize};

/// A student record. Created on first letter submission or self-registration
/// and upserted by `nim` on later submissions; `user_id` links the row to a
/// login account when the student registered one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Student ID number (nomor induk mahasiswa). Natural key.
    pub nim: String,
    pub program: String,
    pub email: String,
    pub phone: String,
    pub user_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
