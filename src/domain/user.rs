//! Users (senders and administrators) and the caller identity.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SendplanError;

/// Row id of a user.
pub type UserId = i64;

/// Role marker distinguishing privileged from restricted users.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sees and administers every assignment
    Admin,
    /// Sees only their own assignments; a scheduling target
    Sender,
}

impl Role {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Sender => "sender",
        }
    }

    /// Check if this role may see and modify every assignment.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = SendplanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "sender" => Ok(Role::Sender),
            other => Err(SendplanError::InvalidInput(format!("unknown role: {}", other))),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,

    /// Unique login; also the sender's display label on assignments
    pub username: String,

    pub name: Option<String>,

    pub role: Role,
}

impl User {
    /// Label written into `account_label` of assignments created for this user.
    pub fn display_name(&self) -> &str {
        &self.username
    }
}

/// Identity on whose behalf a view is read or a status is changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// None for the built-in administrative caller (CLI without `--as`)
    pub id: Option<UserId>,
    pub role: Role,
}

impl Caller {
    /// The built-in administrator.
    pub fn system() -> Self {
        Self {
            id: None,
            role: Role::Admin,
        }
    }

    /// Caller acting as a registered user.
    pub fn from_user(user: &User) -> Self {
        Self {
            id: Some(user.id),
            role: user.role,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Sender ".parse::<Role>().unwrap(), Role::Sender);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_privilege() {
        assert!(Role::Admin.is_privileged());
        assert!(!Role::Sender.is_privileged());
    }

    #[test]
    fn test_caller_from_user() {
        let user = User {
            id: 7,
            username: "maria".to_string(),
            name: None,
            role: Role::Sender,
        };
        let caller = Caller::from_user(&user);
        assert_eq!(caller.id, Some(7));
        assert!(!caller.is_privileged());
        assert!(Caller::system().is_privileged());
    }
}
