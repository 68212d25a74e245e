//! Apply command - reconcile the managed user against the desired state.

use fluxgate::Reconciler;
use fluxgate::client::HttpClient;
use fluxgate::config::{DesiredState, Presence};

use crate::cli::{ApplyArgs, OutputArg, StateArg};

use super::connection_config;

/// Run the apply command
pub async fn run(args: &ApplyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = connection_config(&args.connection);
    config.validate()?;

    let desired = match &args.spec_file {
        Some(path) => DesiredState::from_spec_file(path)?,
        None => desired_from_flags(args),
    };
    desired.validate()?;

    tracing::debug!(user = %desired.name, dry_run = args.dry_run, "starting reconciliation");

    let mut client = HttpClient::connect(&config)?;
    let outcome = Reconciler::new(&mut client)
        .dry_run(args.dry_run)
        .run(&desired)
        .await?;

    match args.output {
        OutputArg::Human => {
            let verdict = match (args.dry_run, outcome.changed) {
                (false, true) => "changed",
                (true, true) => "would change",
                (_, false) => "unchanged",
            };
            println!("{verdict}");
        }
        OutputArg::Json => {
            println!(
                "{}",
                serde_json::json!({ "changed": outcome.changed, "dry_run": args.dry_run })
            );
        }
    }

    Ok(())
}

fn desired_from_flags(args: &ApplyArgs) -> DesiredState {
    let name = args.user_name.clone().unwrap_or_default();
    DesiredState {
        presence: match args.state {
            StateArg::Present => Presence::Present,
            StateArg::Absent => Presence::Absent,
        },
        name,
        password: args.user_password.clone(),
        admin: args.admin,
        grants: args.grants.clone(),
    }
}
