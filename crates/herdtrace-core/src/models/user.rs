//! Request identity models.
//!
//! Authentication happens upstream; requests arrive with a trusted user ID
//! and role.

use serde::{Deserialize, Serialize};

/// Role attached to an authenticated request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Vet,
    Lab,
    Regulator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Vet => "vet",
            Role::Lab => "lab",
            Role::Regulator => "regulator",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "farmer" => Some(Role::Farmer),
            "vet" => Some(Role::Vet),
            "lab" => Some(Role::Lab),
            "regulator" => Some(Role::Regulator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: &str, role: Role) -> Self {
        Self {
            user_id: user_id.to_string(),
            role,
        }
    }
}
