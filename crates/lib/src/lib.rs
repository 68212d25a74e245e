//!
//! Fluxgate: converge a single InfluxDB 1.x user account and its database
//! grants to a declared desired state.
//!
//! Each run re-derives the current state from the live backend, diffs it
//! against the desired state, and applies only the mutations needed to
//! close the gap, reporting whether anything changed. Runs are idempotent:
//! a second run with no external drift reports no change.
//!
//! ## Core Concepts
//!
//! * **Client capability (`client::InfluxClient`)**: the primitive backend
//!   operations: list users, list privileges, switch the session identity,
//!   set password, create/drop user, grant/revoke a privilege.
//! * **State prober (`probe`)**: queries user existence and the current
//!   grant set, and validates a password by briefly assuming the user's
//!   identity (always restoring the operating identity afterwards).
//! * **Diff engine (`diff`)**: pure symmetric difference over grant sets.
//! * **Reconciler (`reconcile::Reconciler`)**: sequences probing, diffing,
//!   and mutation, with a dry-run mode that suppresses every mutating call.
//! * **Configuration (`config`)**: the declared desired state and the
//!   connection settings, validated before reconciliation begins.

pub mod client;
pub mod config;
pub mod diff;
pub mod probe;
pub mod reconcile;
pub mod types;

/// Re-export the reconciler entry points for easier access.
pub use reconcile::{Outcome, Reconciler};

/// Result type used throughout the fluxgate library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the fluxgate library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured backend client errors from the client module
    #[error(transparent)]
    Client(#[from] client::ClientError),

    /// Structured boundary validation errors from the config module
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Client(_) => "client",
            Error::Config(_) => "config",
        }
    }

    /// Check if this error is a transport failure reaching the backend.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Client(e) if e.is_transport())
    }

    /// Check if the backend denied the active credentials.
    pub fn is_auth_denied(&self) -> bool {
        matches!(self, Error::Client(e) if e.is_auth_denied())
    }

    /// Check if the denial was the fresh-cluster "no admin user yet" case.
    pub fn is_admin_required(&self) -> bool {
        matches!(self, Error::Client(e) if e.is_admin_required())
    }

    /// Check if the backend rejected a request for a non-credential reason.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Client(e) if e.is_rejection())
    }

    /// Check if this error was raised during boundary validation.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
