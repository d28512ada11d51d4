use crate::model::letter_type::LetterType;
use crate::model::status::RequestStatus;
use crate::model::student::Student;
use serde::{Deserialize, Serialize};

/// The central workflow entity: one student's request for one letter.
///
/// `reference` is the generated human-readable number (`SUK-YYYYMM-NNNN`),
/// immutable and unique, and the sole lookup key for unauthenticated status
/// tracking. The four nullable timestamps are stamped monotonically as the
/// status advances and are never cleared by a later correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterRequest {
    pub id: String,
    pub reference: String,
    pub student_id: String,
    pub letter_type_id: String,
    pub purpose: String,
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
    pub file_url: Option<String>,
    /// Staff profile id of the admin who last processed the request.
    pub processed_by: Option<String>,
    pub submitted_at: String,
    pub approved_at: Option<String>,
    pub processing_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A request joined with its student and letter type, as served to list,
/// track and detail views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterRequestDetail {
    #[serde(flatten)]
    pub request: LetterRequest,
    pub student: Option<Student>,
    pub letter_type: Option<LetterType>,
    /// Time-limited download link for the stored letter file, present on
    /// completed requests when signing succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}
