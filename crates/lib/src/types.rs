//! Core data types shared across the reconciler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Failed to parse a privilege level.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized privilege '{0}' (expected READ, WRITE, or ALL)")]
pub struct ParsePrivilegeError(pub String);

/// Access tier recognized by the backend.
///
/// Parsing accepts the wire spellings `READ`, `WRITE`, `ALL`, and
/// `ALL PRIVILEGES` (case-insensitive); the canonical rendering is the
/// InfluxQL keyword form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Privilege {
    Read,
    Write,
    All,
}

impl Privilege {
    /// The InfluxQL keyword for this privilege.
    pub fn as_influxql(&self) -> &'static str {
        match self {
            Privilege::Read => "READ",
            Privilege::Write => "WRITE",
            Privilege::All => "ALL",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_influxql())
    }
}

impl FromStr for Privilege {
    type Err = ParsePrivilegeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "READ" => Ok(Privilege::Read),
            "WRITE" => Ok(Privilege::Write),
            "ALL" | "ALL PRIVILEGES" => Ok(Privilege::All),
            _ => Err(ParsePrivilegeError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Privilege {
    type Error = ParsePrivilegeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Privilege> for String {
    fn from(privilege: Privilege) -> Self {
        privilege.as_influxql().to_string()
    }
}

/// An authorization pairing a database with a privilege level, scoped to
/// one user.
///
/// Equality and ordering are structural on the whole (database, privilege)
/// pair, so diff output stays stable across runs.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Grant {
    pub database: String,
    pub privilege: Privilege,
}

impl Grant {
    pub fn new(database: impl Into<String>, privilege: Privilege) -> Self {
        Self {
            database: database.into(),
            privilege,
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ON {}", self.privilege, self.database)
    }
}

/// A user record as reported by the backend's user listing.
///
/// Passwords are write-only and never read back; validity is probed by
/// authenticating with them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Unique user name (login identifier)
    pub name: String,

    /// Whether the user holds the admin role
    pub admin: bool,
}

/// The credential pair active on a backend connection.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: &str, password: Option<&str>) -> Self {
        Self {
            username: username.to_string(),
            password: password.map(str::to_string),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
