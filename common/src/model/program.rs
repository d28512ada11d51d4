use serde::{Deserialize, Serialize};

/// A study program (program studi) catalog entry. Codes are stored
/// uppercase and act as the natural key for CSV import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyProgram {
    pub id: String,
    pub code: String,
    pub name: String,
    pub faculty: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}
