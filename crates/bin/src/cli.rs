//! CLI argument definitions for the fluxgate binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use fluxgate::types::Grant;

/// Desired presence of the managed user
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StateArg {
    /// The user (and its grants) should exist
    Present,
    /// The user should not exist
    Absent,
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    Human,
    Json,
}

/// Fluxgate: converge an InfluxDB user and its grants to a declared state
#[derive(Parser, Debug)]
#[command(name = "fluxgate")]
#[command(about = "Converge an InfluxDB user and its grants to a declared state")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile the managed user against the desired state
    Apply(ApplyArgs),
    /// Check connectivity to the backend
    Ping(PingArgs),
}

/// Connection settings shared by all commands
#[derive(clap::Args, Debug)]
pub struct ConnectionArgs {
    /// Base URL of the InfluxDB HTTP API
    #[arg(long, default_value = "http://localhost:8086", env = "FLUXGATE_URL")]
    pub url: String,

    /// Login username for the operating session
    #[arg(short, long, default_value = "root", env = "FLUXGATE_USERNAME")]
    pub username: String,

    /// Login password for the operating session
    #[arg(short, long, env = "FLUXGATE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = fluxgate::config::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure_skip_tls_verify: bool,
}

/// Arguments for the apply command
#[derive(clap::Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Name of the managed user
    #[arg(long = "user", value_name = "NAME", required_unless_present = "spec_file")]
    pub user_name: Option<String>,

    /// Password the managed user should have
    #[arg(long, env = "FLUXGATE_USER_PASSWORD", hide_env_values = true)]
    pub user_password: Option<String>,

    /// Give the managed user the admin role
    #[arg(long)]
    pub admin: bool,

    /// Desired presence of the user
    #[arg(long, value_enum, default_value = "present")]
    pub state: StateArg,

    /// Desired grant as <database>:<privilege>; repeatable
    #[arg(long = "grant", value_name = "DB:PRIV", value_parser = parse_grant)]
    pub grants: Vec<Grant>,

    /// Read the desired state from a JSON spec file instead of flags
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with_all = ["user_name", "user_password", "admin", "state", "grants"]
    )]
    pub spec_file: Option<PathBuf>,

    /// Compute and report changes without applying any mutation
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputArg,
}

/// Arguments for the ping command
#[derive(clap::Args, Debug)]
pub struct PingArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Parse a `--grant` flag of the form `<database>:<privilege>`.
fn parse_grant(raw: &str) -> Result<Grant, String> {
    let (database, privilege) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected <database>:<privilege>, got '{raw}'"))?;
    if database.is_empty() {
        return Err(format!("empty database name in '{raw}'"));
    }
    let privilege = privilege.parse().map_err(|e| format!("{e}"))?;
    Ok(Grant::new(database, privilege))
}
