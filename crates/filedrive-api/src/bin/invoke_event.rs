//! Run one API-gateway event through the service and print the gateway response.
//!
//! Reads an HTTP API (payload format 2.0) event as JSON from a file or stdin.
//! Configuration comes from the environment, as for the server.

use anyhow::Context;
use clap::Parser;
use filedrive_api::{dispatch, setup, GatewayEvent};
use filedrive_core::Config;
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "invoke_event", about = "Dispatch a gateway event against Filedrive")]
struct Cli {
    /// Path to the event JSON; reads stdin when omitted
    event: Option<PathBuf>,
    /// Pretty-print the response
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let raw = match &cli.event {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read event from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
    };
    let event: GatewayEvent = serde_json::from_str(&raw).context("Invalid gateway event")?;

    let config = Config::from_env()?;
    let state = setup::initialize_state(config).await?;
    let response = dispatch(&state, event).await;

    let out = if cli.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", out);
    Ok(())
}
