//! HTTP implementation of the backend client against the InfluxDB 1.x API.
//!
//! Management statements go through the `/query` endpoint as InfluxQL
//! (reads via GET, mutations via POST) with basic auth from the active
//! session credentials. Response and error translation is factored into
//! pure functions so it is testable without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::InfluxClient;
use super::errors::{ClientError, DenyReason};
use crate::Result;
use crate::config::ConnectionConfig;
use crate::types::{Credentials, Grant, Privilege, UserInfo};

/// JSON shape of a `/query` response body.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Series>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Series {
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Backend client over the InfluxDB 1.x HTTP API.
pub struct HttpClient {
    http: reqwest::Client,
    base: Url,
    session: Credentials,
}

impl HttpClient {
    /// Build a client from validated connection settings.
    ///
    /// No network I/O happens here; the first request is the first call.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let base = config.parsed_url()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| ClientError::Transport {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base,
            session: Credentials::new(&config.username, config.password.as_deref()),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|e| {
            ClientError::Transport {
                reason: format!("invalid endpoint '{path}': {e}"),
            }
            .into()
        })
    }

    /// Run one InfluxQL statement and return the parsed response body.
    async fn query(&self, method: Method, statement: &str) -> Result<QueryResponse> {
        let url = self.endpoint("query")?;
        let response = self
            .http
            .request(method, url)
            .query(&[("q", statement)])
            .basic_auth(&self.session.username, self.session.password.as_deref())
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ClientError::Transport {
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(translate_failure(status.as_u16(), &body).into());
        }

        let parsed: QueryResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse {
                reason: format!("malformed query response: {e}"),
            })?;

        // Statement-level errors come back embedded in a 200 body.
        if let Some(message) = statement_error(&parsed) {
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(parsed)
    }
}

#[async_trait]
impl InfluxClient for HttpClient {
    async fn ping(&self) -> Result<String> {
        let url = self.endpoint("ping")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(translate_failure(status.as_u16(), &body).into());
        }

        let version = response
            .headers()
            .get("X-Influxdb-Version")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        Ok(version)
    }

    async fn list_users(&self) -> Result<Vec<UserInfo>> {
        let response = self.query(Method::GET, "SHOW USERS").await?;
        Ok(users_from_response(&response)?)
    }

    async fn list_privileges(&self, name: &str) -> Result<Vec<Grant>> {
        let statement = format!("SHOW GRANTS FOR {}", quote_ident(name));
        let response = self.query(Method::GET, &statement).await?;
        Ok(grants_from_response(&response)?)
    }

    fn session(&self) -> Credentials {
        self.session.clone()
    }

    fn switch_identity(&mut self, username: &str, password: Option<&str>) {
        self.session = Credentials::new(username, password);
    }

    async fn set_password(&self, name: &str, password: &str) -> Result<()> {
        debug!(user = name, "issuing password change");
        let statement = format!(
            "SET PASSWORD FOR {} = {}",
            quote_ident(name),
            quote_string(password)
        );
        self.query(Method::POST, &statement).await?;
        Ok(())
    }

    async fn create_user(&self, name: &str, password: Option<&str>, admin: bool) -> Result<()> {
        debug!(user = name, admin, "issuing user creation");
        let mut statement = format!("CREATE USER {}", quote_ident(name));
        if let Some(password) = password {
            statement.push_str(&format!(" WITH PASSWORD {}", quote_string(password)));
        }
        if admin {
            statement.push_str(" WITH ALL PRIVILEGES");
        }
        self.query(Method::POST, &statement).await?;
        Ok(())
    }

    async fn drop_user(&self, name: &str) -> Result<()> {
        debug!(user = name, "issuing user drop");
        let statement = format!("DROP USER {}", quote_ident(name));
        self.query(Method::POST, &statement).await?;
        Ok(())
    }

    async fn grant_privilege(&self, grant: &Grant, name: &str) -> Result<()> {
        debug!(user = name, grant = %grant, "issuing grant");
        let statement = format!(
            "GRANT {} ON {} TO {}",
            grant.privilege.as_influxql(),
            quote_ident(&grant.database),
            quote_ident(name)
        );
        self.query(Method::POST, &statement).await?;
        Ok(())
    }

    async fn revoke_privilege(&self, grant: &Grant, name: &str) -> Result<()> {
        debug!(user = name, grant = %grant, "issuing revoke");
        let statement = format!(
            "REVOKE {} ON {} FROM {}",
            grant.privilege.as_influxql(),
            quote_ident(&grant.database),
            quote_ident(name)
        );
        self.query(Method::POST, &statement).await?;
        Ok(())
    }
}

/// Quote an InfluxQL identifier (user or database name).
fn quote_ident(name: &str) -> String {
    format!(
        "\"{}\"",
        name.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Quote an InfluxQL string literal (passwords).
fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Translate a non-2xx response into a structured error.
fn translate_failure(status: u16, body: &str) -> ClientError {
    let message = error_message(body);
    if status == 401 {
        let reason = deny_reason(&message);
        ClientError::AuthDenied { reason, message }
    } else {
        ClientError::Rejected { status, message }
    }
}

/// Extract the `error` field from a JSON error body, falling back to the
/// raw text.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no error detail".to_string()
            } else {
                trimmed.to_string()
            }
        }
    }
}

/// Classify a 401 body. The one place raw backend wording is inspected;
/// everything past this boundary matches on [`DenyReason`].
fn deny_reason(message: &str) -> DenyReason {
    if message.contains("create admin user first") {
        DenyReason::AdminRequired
    } else {
        DenyReason::BadCredentials
    }
}

/// First statement-level error in a successful response, if any.
fn statement_error(response: &QueryResponse) -> Option<String> {
    response
        .error
        .clone()
        .or_else(|| response.results.iter().find_map(|r| r.error.clone()))
}

fn column_index(series: &Series, column: &str) -> std::result::Result<usize, ClientError> {
    series
        .columns
        .iter()
        .position(|c| c == column)
        .ok_or_else(|| ClientError::InvalidResponse {
            reason: format!("series missing '{column}' column"),
        })
}

/// Translate a `SHOW USERS` response into user records.
fn users_from_response(
    response: &QueryResponse,
) -> std::result::Result<Vec<UserInfo>, ClientError> {
    let mut users = Vec::new();
    for series in response.results.iter().flat_map(|r| r.series.iter()) {
        let name_idx = column_index(series, "user")?;
        let admin_idx = column_index(series, "admin")?;
        for row in &series.values {
            let name = row
                .get(name_idx)
                .and_then(|v| v.as_str())
                .ok_or_else(|| ClientError::InvalidResponse {
                    reason: "user row missing name".to_string(),
                })?;
            let admin = row.get(admin_idx).and_then(|v| v.as_bool()).unwrap_or(false);
            users.push(UserInfo {
                name: name.to_string(),
                admin,
            });
        }
    }
    Ok(users)
}

/// Translate a `SHOW GRANTS FOR` response into grants.
///
/// `NO PRIVILEGES` rows denote the absence of a grant and are dropped.
fn grants_from_response(
    response: &QueryResponse,
) -> std::result::Result<Vec<Grant>, ClientError> {
    let mut grants = Vec::new();
    for series in response.results.iter().flat_map(|r| r.series.iter()) {
        let db_idx = column_index(series, "database")?;
        let priv_idx = column_index(series, "privilege")?;
        for row in &series.values {
            let database = row
                .get(db_idx)
                .and_then(|v| v.as_str())
                .ok_or_else(|| ClientError::InvalidResponse {
                    reason: "grant row missing database".to_string(),
                })?;
            let privilege = row
                .get(priv_idx)
                .and_then(|v| v.as_str())
                .ok_or_else(|| ClientError::InvalidResponse {
                    reason: "grant row missing privilege".to_string(),
                })?;
            if privilege.eq_ignore_ascii_case("NO PRIVILEGES") {
                continue;
            }
            let privilege =
                privilege
                    .parse::<Privilege>()
                    .map_err(|e| ClientError::InvalidResponse {
                        reason: e.to_string(),
                    })?;
            grants.push(Grant::new(database, privilege));
        }
    }
    Ok(grants)
}
