//! Command implementations for the fluxgate binary.

pub mod apply;
pub mod ping;

use fluxgate::config::ConnectionConfig;

use crate::cli::ConnectionArgs;

/// Build connection settings from the shared CLI flags.
pub fn connection_config(args: &ConnectionArgs) -> ConnectionConfig {
    let mut config = ConnectionConfig::new(&args.url, &args.username);
    config.password = args.password.clone();
    config.timeout_secs = args.timeout;
    config.verify_tls = !args.insecure_skip_tls_verify;
    config
}
