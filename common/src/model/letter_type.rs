use serde::{Deserialize, Serialize};

/// A catalog entry describing a requestable kind of letter.
///
/// Inactive types are hidden from the student submission form but stay valid
/// for historical requests. `template` is free text with `{{token}}`
/// placeholders; when empty the renderer falls back to the default layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterType {
    pub id: String,
    /// Short unique code, e.g. `SK-AKTIF`.
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Addressee line printed at the top of the letter
    /// ("Kepada Yth. ..." in the default letterhead language).
    pub addressee: Option<String>,
    pub template: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}
