//! Service status probes.

use anyhow::{bail, Result};
use owo_colors::OwoColorize;

use crate::{
    config::Config,
    execution::{ExecutionClient, HttpExecutionClient},
    session::backend_down_message,
};

pub async fn health(cfg: &Config) -> Result<()> {
    let client = HttpExecutionClient::from_config(cfg)?;
    if client.health().await {
        println!("{} ({})", "Backend Connected".green(), client.endpoint());
        Ok(())
    } else {
        eprintln!("{}", "Backend Disconnected".red());
        bail!(backend_down_message(client.endpoint(), None))
    }
}

pub async fn check_compiler(cfg: &Config) -> Result<()> {
    let client = HttpExecutionClient::from_config(cfg)?;
    let status = client.check_c_compiler().await;
    if status.available {
        println!(
            "C compiler ready ({}). You can now compile and run C code.",
            status.version.unwrap_or_else(|| "unknown version".into())
        );
        Ok(())
    } else {
        bail!(
            "C compiler not available: {}\n\nPlease install gcc on your system to use the C compiler.",
            status.error.unwrap_or_else(|| "unknown error".into())
        )
    }
}
