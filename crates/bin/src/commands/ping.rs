//! Ping command - checks connectivity to the backend.

use fluxgate::client::{HttpClient, InfluxClient};

use crate::cli::PingArgs;

use super::connection_config;

/// Run the ping command
pub async fn run(args: &PingArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = connection_config(&args.connection);
    config.validate()?;

    let client = HttpClient::connect(&config)?;
    match client.ping().await {
        Ok(version) => {
            println!("ok: InfluxDB {version}");
            Ok(())
        }
        Err(e) => {
            eprintln!("unreachable: {e}");
            std::process::exit(1);
        }
    }
}
