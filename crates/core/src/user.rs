//! Application users. Only used to authenticate API calls and to record who
//! wrote a mission.

use serde::{Deserialize, Serialize};

use crate::id::UserId;
use crate::Time;

/// An account allowed to call the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Role
    pub role: UserRole,

    /// Inactive users cannot authenticate
    pub active: bool,

    /// Bearer token
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub api_token: String,

    /// Creation timestamp
    pub created_at: Time,
}

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access
    Admin,
    /// Fleet manager
    Manager,
    /// Day-to-day operator
    Operator,
}

impl UserRole {
    /// Stable lowercase name, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Operator => "operator",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = crate::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "operator" => Ok(Self::Operator),
            _ => Err(crate::ParseEnumError::new("user role", s)),
        }
    }
}

impl User {
    /// Redacted copy for display.
    pub fn without_token(&self) -> Self {
        Self {
            api_token: String::new(),
            ..self.clone()
        }
    }
}
