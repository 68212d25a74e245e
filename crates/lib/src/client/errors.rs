//! Error types for the backend client.
//!
//! Backend failures are translated into structured variants at the client
//! boundary; the reconciliation core matches on these by kind, never by
//! inspecting message text.

use thiserror::Error;

/// Why the backend denied the active credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// The credentials did not authenticate.
    BadCredentials,

    /// Fresh cluster with authentication enabled and no admin user yet.
    AdminRequired,
}

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Network or connection failure reaching the backend.
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// The backend denied the active credentials (401-equivalent).
    #[error("authorization denied: {message}")]
    AuthDenied { reason: DenyReason, message: String },

    /// Any other backend-reported rejection; message passed through
    /// unmodified.
    #[error("backend rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend answered with a body this client could not interpret.
    #[error("invalid response from backend: {reason}")]
    InvalidResponse { reason: String },
}

impl ClientError {
    /// Check if this is a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }

    /// Check if the backend denied the active credentials.
    pub fn is_auth_denied(&self) -> bool {
        matches!(self, ClientError::AuthDenied { .. })
    }

    /// Check if the denial was the fresh-cluster "no admin user yet" case.
    pub fn is_admin_required(&self) -> bool {
        matches!(
            self,
            ClientError::AuthDenied {
                reason: DenyReason::AdminRequired,
                ..
            }
        )
    }

    /// Check if the backend rejected a request for a non-credential reason.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }
}
