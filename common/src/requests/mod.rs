//! Request and response payloads exchanged between clients and the backend.
//!
//! Validation lives here so every entry point (HTTP handlers, CSV import)
//! applies the same rules before touching the database.

use crate::model::status::RequestStatus;
use serde::{Deserialize, Serialize};

fn looks_like_email(s: &str) -> bool {
    s.contains('@') && s.contains('.')
}

/// Student-facing submission form payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub name: String,
    pub nim: String,
    pub program: String,
    pub email: String,
    pub phone: String,
    pub letter_type_id: String,
    pub purpose: String,
}

impl SubmitRequest {
    /// Mirrors the submission form schema: checked before any write.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().len() < 3 {
            return Err("Nama minimal 3 karakter".to_string());
        }
        if self.nim.trim().len() < 5 || self.nim.trim().len() > 20 {
            return Err("NIM tidak valid".to_string());
        }
        if self.program.trim().len() < 3 {
            return Err("Program studi wajib diisi".to_string());
        }
        if !looks_like_email(&self.email) {
            return Err("Email tidak valid".to_string());
        }
        let phone = self.phone.trim();
        if phone.len() < 10 || phone.len() > 15 {
            return Err("Nomor HP tidak valid".to_string());
        }
        if self.letter_type_id.trim().is_empty() {
            return Err("Pilih jenis surat".to_string());
        }
        let purpose = self.purpose.trim();
        if purpose.len() < 10 || purpose.len() > 1000 {
            return Err("Keperluan minimal 10 karakter".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub reference: String,
}

/// Admin edit of a request: status, notes. `processed_by` is derived from
/// the session, never from the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub status: RequestStatus,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveLetterType {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub addressee: Option<String>,
    pub template: Option<String>,
    pub is_active: bool,
}

impl SaveLetterType {
    pub fn validate(&self) -> Result<(), String> {
        if self.code.trim().is_empty() || self.name.trim().is_empty() {
            return Err("Kode dan Nama wajib diisi".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveStudent {
    pub name: String,
    pub nim: String,
    pub program: String,
    pub email: String,
    pub phone: String,
}

impl SaveStudent {
    pub fn validate(&self) -> Result<(), String> {
        if self.nim.trim().is_empty() || self.name.trim().is_empty() {
            return Err("NIM dan Nama wajib diisi".to_string());
        }
        if !looks_like_email(&self.email) {
            return Err("Email tidak valid".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveStudyProgram {
    pub code: String,
    pub name: String,
    pub faculty: Option<String>,
    pub is_active: bool,
}

impl SaveStudyProgram {
    pub fn validate(&self) -> Result<(), String> {
        if self.code.trim().is_empty() || self.name.trim().is_empty() {
            return Err("Kode dan nama wajib diisi".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Staff self-registration: creates a login account plus a staff profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffRegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Student self-registration: creates a login account plus a linked
/// student row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRegisterRequest {
    pub name: String,
    pub nim: String,
    pub program: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

impl StudentRegisterRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().len() < 3 || self.nim.trim().len() < 5 {
            return Err("Nama atau NIM tidak valid".to_string());
        }
        if !looks_like_email(&self.email) {
            return Err("Email tidak valid".to_string());
        }
        if self.password.len() < 6 {
            return Err("Password minimal 6 karakter".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePasswordRequest {
    pub new_password: String,
}

/// Staff settings form: the caller's own display name and login email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().len() < 3 {
            return Err("Nama minimal 3 karakter".to_string());
        }
        if !looks_like_email(&self.email) {
            return Err("Email tidak valid".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: String,
    pub email: String,
    /// `staff` or `student`.
    pub kind: String,
}

/// Result of a CSV catalog import: rows upserted vs rows skipped for
/// missing required fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_submit() -> SubmitRequest {
        SubmitRequest {
            name: "Test Student".to_string(),
            nim: "12345678".to_string(),
            program: "Teknik Informatika".to_string(),
            email: "test@example.com".to_string(),
            phone: "081234567890".to_string(),
            letter_type_id: "lt-1".to_string(),
            purpose: "Keperluan beasiswa semester ini".to_string(),
        }
    }

    #[test]
    fn submit_validation_accepts_well_formed_payload() {
        assert!(valid_submit().validate().is_ok());
    }

    #[test]
    fn submit_validation_rejects_short_purpose() {
        let mut req = valid_submit();
        req.purpose = "beasiswa".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn submit_validation_rejects_bad_email() {
        let mut req = valid_submit();
        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }
}
