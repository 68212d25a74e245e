//! Backend client capability for the InfluxDB HTTP API.
//!
//! The reconciliation core only ever talks to the backend through the
//! [`InfluxClient`] trait; [`HttpClient`] is the production implementation
//! and the integration tests substitute a scripted mock.

pub mod errors;
pub mod http;

pub use errors::{ClientError, DenyReason};
pub use http::HttpClient;

use async_trait::async_trait;

use crate::Result;
use crate::types::{Credentials, Grant, UserInfo};

/// Primitive operations against the backing time-series database.
///
/// Calls are strictly sequential: one request in flight at a time.
/// Implementations are not required to be safe for concurrent use.
#[async_trait]
pub trait InfluxClient: Send {
    /// Check connectivity and return the backend's reported version.
    async fn ping(&self) -> Result<String>;

    /// List all user accounts.
    async fn list_users(&self) -> Result<Vec<UserInfo>>;

    /// List the named user's current grants.
    async fn list_privileges(&self, name: &str) -> Result<Vec<Grant>>;

    /// The credential pair currently active on this connection.
    fn session(&self) -> Credentials;

    /// Replace the active session identity.
    ///
    /// A local credential swap on the connection; no network I/O happens
    /// until the next call.
    fn switch_identity(&mut self, username: &str, password: Option<&str>);

    /// Set the named user's password.
    async fn set_password(&self, name: &str, password: &str) -> Result<()>;

    /// Create a user, optionally with a password and the admin role.
    async fn create_user(&self, name: &str, password: Option<&str>, admin: bool) -> Result<()>;

    /// Drop a user.
    async fn drop_user(&self, name: &str) -> Result<()>;

    /// Grant a privilege on a database to the named user.
    async fn grant_privilege(&self, grant: &Grant, name: &str) -> Result<()>;

    /// Revoke a privilege on a database from the named user.
    async fn revoke_privilege(&self, grant: &Grant, name: &str) -> Result<()>;
}
