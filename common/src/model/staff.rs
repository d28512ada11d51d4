use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    SuperAdmin,
    Admin,
}

/// An administrator account, linked 1:1 to a login identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffProfile {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl StaffRole {
    pub fn as_str(self) -> &'static str {
        match self {
            StaffRole::SuperAdmin => "super_admin",
            StaffRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> StaffRole {
        if s == "super_admin" {
            StaffRole::SuperAdmin
        } else {
            StaffRole::Admin
        }
    }
}
