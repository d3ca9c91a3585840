//! Package management: install and list packages in the execution environment.

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::{
    config::Config,
    execution::HttpExecutionClient,
    packages::PackageResolver,
    printer::OutputPrinter,
};

pub async fn install(cfg: &Config, name: &str, printer: &OutputPrinter) -> Result<()> {
    let resolver = PackageResolver::new(Arc::new(HttpExecutionClient::from_config(cfg)?));
    printer.status(&format!("Installing {}...", name.trim()));
    if resolver.install(name).await {
        println!("Successfully installed {}", name.trim());
        Ok(())
    } else {
        let reason = resolver.last_error().unwrap_or_else(|| "unknown error".into());
        bail!("Failed to install {}: {}", name.trim(), reason)
    }
}

pub async fn list(cfg: &Config) -> Result<()> {
    let resolver = PackageResolver::new(Arc::new(HttpExecutionClient::from_config(cfg)?));
    resolver.refresh().await?;

    let installed = resolver.installed();
    println!("Installed ({})", installed.len());
    if installed.is_empty() {
        println!("  No packages installed yet");
    }
    for pkg in &installed {
        println!("  {}", pkg);
    }

    let suggestions = resolver.suggestions();
    if !suggestions.is_empty() {
        println!("Quick install: {}", suggestions.iter().take(5).copied().collect::<Vec<_>>().join(", "));
    }
    Ok(())
}
