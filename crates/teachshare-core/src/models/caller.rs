use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use super::search::VisibilityScope;
use crate::AppError;

/// Role carried by an already-authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Educator,
    Moderator,
    Admin,
}

impl Role {
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" | "public" => Ok(Role::User),
            "educator" => Ok(Role::Educator),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(AppError::InvalidInput(format!("Unknown role: {}", s))),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::User => write!(f, "user"),
            Role::Educator => write!(f, "educator"),
            Role::Moderator => write!(f, "moderator"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Identity of the caller as established by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Search scope this caller is entitled to.
    pub fn scope(&self) -> VisibilityScope {
        if self.role.is_reviewer() {
            VisibilityScope::Reviewer
        } else {
            VisibilityScope::Public
        }
    }
}
