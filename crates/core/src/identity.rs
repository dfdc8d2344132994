//! Caller identities and privilege decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Numeric user identifier issued by the identity authority.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The authenticated principal performing one operation.
///
/// Built from a verified credential and dropped when the operation ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Who the caller is.
    pub user_id: UserId,
    /// Email claim, when the credential carries one.
    pub email: Option<String>,
    /// Application the credential was issued for, when present.
    pub app_id: Option<i32>,
    /// Credential expiry.
    pub expires_at: OffsetDateTime,
}

/// Privileges the identity authority can be asked about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Privilege {
    /// May delete any alias.
    Admin,
}

impl Privilege {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer from the identity authority for one identity and privilege.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrivilegeDecision {
    pub user_id: UserId,
    pub privilege: Privilege,
    pub granted: bool,
}

impl PrivilegeDecision {
    /// Returns `Ok(())` when granted, otherwise a description of the denial.
    pub fn require(&self) -> Result<(), String> {
        if self.granted {
            Ok(())
        } else {
            Err(format!(
                "user {} lacks the {} privilege",
                self.user_id, self.privilege
            ))
        }
    }
}
