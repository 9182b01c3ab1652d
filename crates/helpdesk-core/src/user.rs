use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown user type: {0}")]
pub struct UnknownRole(pub i64);

/// Which dashboard a user gets and which mutations the server permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Role {
    Client,
    Support,
}

impl Role {
    pub fn code(&self) -> i64 {
        match self {
            Role::Client => 0,
            Role::Support => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Client => "Client",
            Role::Support => "Support",
        }
    }
}

impl TryFrom<i64> for Role {
    type Error = UnknownRole;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Role::Client),
            1 => Ok(Role::Support),
            other => Err(UnknownRole(other)),
        }
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        role.code()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(rename = "userType")]
    pub role: Role,
}

/// Entry of the support-side client directory. Same wire shape as a user.
pub type ClientSummary = User;
