//! Test helpers: a scripted in-memory backend client with call recording
//! and fault injection.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use fluxgate::Result;
use fluxgate::client::{ClientError, DenyReason, InfluxClient};
use fluxgate::config::DesiredState;
use fluxgate::types::{Credentials, Grant, Privilege, UserInfo};

/// Operating credentials every mock session starts with.
pub const OPERATOR: &str = "admin";
pub const OPERATOR_PASSWORD: &str = "adminpw";

/// A call observed by the mock, in invocation order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    ListUsers,
    ListPrivileges(String),
    SwitchIdentity(String),
    SetPassword(String),
    CreateUser { name: String, admin: bool },
    DropUser(String),
    Grant { grant: Grant, user: String },
    Revoke { grant: Grant, user: String },
}

/// Which operation the injected fault fires on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultOn {
    ListUsers,
    ListPrivileges,
    SetPassword,
    CreateUser,
    DropUser,
    Grant,
    Revoke,
}

#[derive(Clone, Debug)]
struct MockUser {
    name: String,
    password: Option<String>,
    admin: bool,
    grants: Vec<Grant>,
}

struct MockState {
    users: Vec<MockUser>,
    session: Credentials,
    calls: Vec<Call>,
    fault: Option<FaultOn>,
    fresh_cluster: bool,
}

/// Scripted backend client for reconciler and prober tests.
///
/// Authentication model: a session whose username matches a stored user
/// must present that user's password; unknown usernames are treated as
/// external operators and allowed. A fresh cluster denies the user listing
/// with the admin-required reason until the first user exists.
pub struct MockClient {
    state: Mutex<MockState>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                users: Vec::new(),
                session: operator_credentials(),
                calls: Vec::new(),
                fault: None,
                fresh_cluster: false,
            }),
        }
    }

    /// A mock with one user already present.
    pub fn with_user(name: &str, password: Option<&str>, admin: bool) -> Self {
        let client = Self::new();
        client.add_user(name, password, admin);
        client
    }

    /// A mock simulating a brand-new cluster with auth enabled and no
    /// admin user yet.
    pub fn fresh_cluster() -> Self {
        let client = Self::new();
        client.state.lock().unwrap().fresh_cluster = true;
        client
    }

    pub fn add_user(&self, name: &str, password: Option<&str>, admin: bool) {
        self.state.lock().unwrap().users.push(MockUser {
            name: name.to_string(),
            password: password.map(str::to_string),
            admin,
            grants: Vec::new(),
        });
    }

    pub fn set_grants(&self, name: &str, grants: &[Grant]) {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.name == name)
            .expect("set_grants target should exist");
        user.grants = grants.to_vec();
    }

    /// Arm a single injected fault; the matching operation fails with a
    /// transport error every time it is invoked.
    pub fn fail_on(&self, fault: FaultOn) {
        self.state.lock().unwrap().fault = Some(fault);
    }

    // ===== OBSERVATION HELPERS =====

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn session_identity(&self) -> Credentials {
        self.state.lock().unwrap().session.clone()
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.state.lock().unwrap().users.iter().any(|u| u.name == name)
    }

    pub fn user_password(&self, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.name == name)
            .and_then(|u| u.password.clone())
    }

    pub fn user_is_admin(&self, name: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.name == name)
            .map(|u| u.admin)
            .unwrap_or(false)
    }

    pub fn user_grants(&self, name: &str) -> Vec<Grant> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.name == name)
            .map(|u| u.grants.clone())
            .unwrap_or_default()
    }

    // ===== INTERNAL BEHAVIOR =====

    fn check_fault(state: &MockState, op: FaultOn) -> std::result::Result<(), ClientError> {
        if state.fault == Some(op) {
            return Err(ClientError::Transport {
                reason: format!("injected fault on {op:?}"),
            });
        }
        Ok(())
    }

    fn authenticate(state: &MockState) -> std::result::Result<(), ClientError> {
        if state.fresh_cluster && state.users.is_empty() {
            return Err(ClientError::AuthDenied {
                reason: DenyReason::AdminRequired,
                message: "create admin user first or disable authentication".to_string(),
            });
        }
        if let Some(user) = state
            .users
            .iter()
            .find(|u| u.name == state.session.username)
        {
            if user.password != state.session.password {
                return Err(ClientError::AuthDenied {
                    reason: DenyReason::BadCredentials,
                    message: "authorization failed".to_string(),
                });
            }
        }
        Ok(())
    }

    fn rejected(message: impl Into<String>) -> ClientError {
        ClientError::Rejected {
            status: 400,
            message: message.into(),
        }
    }
}

#[async_trait]
impl InfluxClient for MockClient {
    async fn ping(&self) -> Result<String> {
        Ok("1.8.10-mock".to_string())
    }

    async fn list_users(&self) -> Result<Vec<UserInfo>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListUsers);
        Self::check_fault(&state, FaultOn::ListUsers)?;
        Self::authenticate(&state)?;
        Ok(state
            .users
            .iter()
            .map(|u| UserInfo {
                name: u.name.clone(),
                admin: u.admin,
            })
            .collect())
    }

    async fn list_privileges(&self, name: &str) -> Result<Vec<Grant>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListPrivileges(name.to_string()));
        Self::check_fault(&state, FaultOn::ListPrivileges)?;
        let user = state
            .users
            .iter()
            .find(|u| u.name == name)
            .ok_or_else(|| Self::rejected(format!("user not found: {name}")))?;
        Ok(user.grants.clone())
    }

    fn session(&self) -> Credentials {
        self.state.lock().unwrap().session.clone()
    }

    fn switch_identity(&mut self, username: &str, password: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::SwitchIdentity(username.to_string()));
        state.session = Credentials::new(username, password);
    }

    async fn set_password(&self, name: &str, password: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::SetPassword(name.to_string()));
        Self::check_fault(&state, FaultOn::SetPassword)?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.name == name)
            .ok_or_else(|| Self::rejected(format!("user not found: {name}")))?;
        user.password = Some(password.to_string());
        Ok(())
    }

    async fn create_user(&self, name: &str, password: Option<&str>, admin: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateUser {
            name: name.to_string(),
            admin,
        });
        Self::check_fault(&state, FaultOn::CreateUser)?;
        if state.users.iter().any(|u| u.name == name) {
            return Err(Self::rejected(format!("user already exists: {name}")).into());
        }
        state.users.push(MockUser {
            name: name.to_string(),
            password: password.map(str::to_string),
            admin,
            grants: Vec::new(),
        });
        Ok(())
    }

    async fn drop_user(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DropUser(name.to_string()));
        Self::check_fault(&state, FaultOn::DropUser)?;
        let before = state.users.len();
        state.users.retain(|u| u.name != name);
        if state.users.len() == before {
            return Err(Self::rejected(format!("user not found: {name}")).into());
        }
        Ok(())
    }

    async fn grant_privilege(&self, grant: &Grant, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Grant {
            grant: grant.clone(),
            user: name.to_string(),
        });
        Self::check_fault(&state, FaultOn::Grant)?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.name == name)
            .ok_or_else(|| Self::rejected(format!("user not found: {name}")))?;
        if !user.grants.contains(grant) {
            user.grants.push(grant.clone());
        }
        Ok(())
    }

    async fn revoke_privilege(&self, grant: &Grant, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Revoke {
            grant: grant.clone(),
            user: name.to_string(),
        });
        Self::check_fault(&state, FaultOn::Revoke)?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.name == name)
            .ok_or_else(|| Self::rejected(format!("user not found: {name}")))?;
        user.grants.retain(|g| g != grant);
        Ok(())
    }
}

// ===== CONSTRUCTION HELPERS =====

pub fn operator_credentials() -> Credentials {
    Credentials::new(OPERATOR, Some(OPERATOR_PASSWORD))
}

pub fn grant(database: &str, privilege: Privilege) -> Grant {
    Grant::new(database, privilege)
}

/// Desired state for a present user with a password and no grants.
pub fn desired_with_password(name: &str, password: &str) -> DesiredState {
    DesiredState {
        password: Some(password.to_string()),
        ..DesiredState::present(name)
    }
}

// ===== VERIFICATION HELPERS =====

/// Assert that no mutating call was issued to the mock.
pub fn assert_no_mutations(client: &MockClient) {
    let mutations: Vec<Call> = client
        .calls()
        .into_iter()
        .filter(|call| {
            matches!(
                call,
                Call::SetPassword(_)
                    | Call::CreateUser { .. }
                    | Call::DropUser(_)
                    | Call::Grant { .. }
                    | Call::Revoke { .. }
            )
        })
        .collect();
    assert!(
        mutations.is_empty(),
        "expected no mutating calls, observed {mutations:?}"
    );
}

/// Assert that every revoke in the call log precedes every grant.
pub fn assert_revokes_before_adds(client: &MockClient) {
    let calls = client.calls();
    let last_revoke = calls
        .iter()
        .rposition(|c| matches!(c, Call::Revoke { .. }));
    let first_grant = calls.iter().position(|c| matches!(c, Call::Grant { .. }));
    if let (Some(last_revoke), Some(first_grant)) = (last_revoke, first_grant) {
        assert!(
            last_revoke < first_grant,
            "revokes should all run before adds: {calls:?}"
        );
    }
}
