//! Boundary configuration: the declared desired state and the connection
//! settings, validated before reconciliation begins.
//!
//! The reconciliation core never parses anything; everything it receives
//! has passed through `validate()` here.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::types::Privilege;

/// Default request timeout, matching the backend client's usual default.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised during boundary validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid backend url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("user name must not be empty")]
    MissingUserName,

    #[error("database '{database}' declared with both {first} and {second} privileges")]
    ConflictingGrants {
        database: String,
        first: Privilege,
        second: Privilege,
    },

    #[error("failed to load spec file '{path}': {reason}")]
    SpecFile { path: String, reason: String },
}

/// Target presence of the managed user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    #[default]
    Present,
    Absent,
}

/// The declarative input: what the managed user should look like.
///
/// Immutable for the duration of one reconciliation run. Deserializes from
/// the same field names the invocation surface uses (`state`, `user_name`,
/// `user_password`, `admin`, `grants`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DesiredState {
    /// Target presence of the user.
    #[serde(rename = "state", default)]
    pub presence: Presence,

    /// Name of the managed user.
    #[serde(rename = "user_name")]
    pub name: String,

    /// Password to converge the user to. Write-only; validity is probed by
    /// authenticating with it, never by reading it back.
    #[serde(rename = "user_password", default)]
    pub password: Option<String>,

    /// Whether the user should hold the admin role.
    #[serde(default)]
    pub admin: bool,

    /// Grants the user should end up with, at most one privilege per
    /// database.
    #[serde(default)]
    pub grants: Vec<crate::types::Grant>,
}

impl DesiredState {
    /// A minimal present-state descriptor for the named user.
    pub fn present(name: impl Into<String>) -> Self {
        Self {
            presence: Presence::Present,
            name: name.into(),
            password: None,
            admin: false,
            grants: Vec::new(),
        }
    }

    /// A descriptor declaring the named user absent.
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            presence: Presence::Absent,
            ..Self::present(name)
        }
    }

    /// Load a desired state from a JSON spec file.
    ///
    /// The file is parsed only; call [`validate`](Self::validate) before
    /// handing the result to the reconciler.
    pub fn from_spec_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::SpecFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::SpecFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate the descriptor before any network call is made.
    ///
    /// Rejects an empty user name and two different privileges declared for
    /// the same database (the backend tracks one privilege per database per
    /// user).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingUserName);
        }

        let mut declared: HashMap<&str, Privilege> = HashMap::new();
        for grant in &self.grants {
            if let Some(previous) = declared.insert(grant.database.as_str(), grant.privilege) {
                if previous != grant.privilege {
                    return Err(ConfigError::ConflictingGrants {
                        database: grant.database.clone(),
                        first: previous,
                        second: grant.privilege,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Connection settings for the backend HTTP API.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Base URL of the backend HTTP API (http or https).
    pub url: String,

    /// Login username for the operating session.
    pub username: String,

    /// Login password for the operating session.
    pub password: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Whether to verify the backend's TLS certificate.
    pub verify_tls: bool,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verify_tls: true,
        }
    }

    /// Validate the settings before a client is constructed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_url().map(|_| ())
    }

    pub(crate) fn parsed_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.url).map_err(|e| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidUrl {
                url: self.url.clone(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}
