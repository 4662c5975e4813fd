use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which side of a tutoring relationship a progress record belongs to.
///
/// Every user-role pair owns its own progress vector and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Tutor,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl Role {
    pub const ALL: [Role; 2] = [Role::Student, Role::Tutor];

    /// Storage representation, shared with the user record schema.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Tutor => "TUTOR",
        }
    }

    /// The other party of a student/tutor pairing.
    #[must_use]
    pub fn counterpart(self) -> Role {
        match self {
            Role::Student => Role::Tutor,
            Role::Tutor => Role::Student,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Role::Student),
            "TUTOR" => Ok(Role::Tutor),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}
