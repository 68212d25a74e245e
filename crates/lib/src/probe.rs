//! State probing: user existence, password validity, current grant set.
//!
//! Probes never cache: every answer is re-derived from the live backend.

use tracing::debug;

use crate::Result;
use crate::client::InfluxClient;
use crate::types::{Credentials, Grant, UserInfo};

/// Restores a previously captured session identity when dropped.
///
/// Holds the client exclusively while a probe runs under another user's
/// identity, so no other call can slip in mid-switch and the operating
/// credentials come back on every exit path, panics included.
struct IdentityGuard<'a, C: InfluxClient + ?Sized> {
    client: &'a mut C,
    restore: Credentials,
}

impl<'a, C: InfluxClient + ?Sized> IdentityGuard<'a, C> {
    fn switch(client: &'a mut C, username: &str, password: Option<&str>) -> Self {
        let restore = client.session();
        client.switch_identity(username, password);
        Self { client, restore }
    }
}

impl<C: InfluxClient + ?Sized> Drop for IdentityGuard<'_, C> {
    fn drop(&mut self) {
        self.client
            .switch_identity(&self.restore.username, self.restore.password.as_deref());
    }
}

/// Look up the named user in the backend's user listing.
///
/// A fresh cluster with authentication enabled but no admin user yet denies
/// the listing; that denial is swallowed here and reported as "not found"
/// so the bootstrap create can proceed. Any other failure is surfaced.
pub async fn find_user<C>(client: &C, name: &str) -> Result<Option<UserInfo>>
where
    C: InfluxClient + ?Sized,
{
    match client.list_users().await {
        Ok(users) => Ok(users.into_iter().find(|user| user.name == name)),
        Err(e) if e.is_admin_required() => {
            debug!(user = name, "backend has no admin user yet, treating user as absent");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Check whether `password` currently authenticates `name`.
///
/// Temporarily assumes the user's identity and attempts a privileged
/// listing call. An auth denial means the password is wrong; any other
/// failure is fatal. The original session identity is restored on every
/// exit path.
pub async fn check_password<C>(client: &mut C, name: &str, password: &str) -> Result<bool>
where
    C: InfluxClient + ?Sized,
{
    let guard = IdentityGuard::switch(client, name, Some(password));
    let outcome = guard.client.list_users().await;
    drop(guard);

    match outcome {
        Ok(_) => Ok(true),
        Err(e) if e.is_auth_denied() => {
            debug!(user = name, "supplied password does not authenticate");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Query the user's current grants. Every backend failure is fatal.
pub async fn current_grants<C>(client: &C, name: &str) -> Result<Vec<Grant>>
where
    C: InfluxClient + ?Sized,
{
    client.list_privileges(name).await
}
