use std::path::PathBuf;

use anyhow::Result;
use tether_cli::{init_tracing, print_banner};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    // fixed at startup; no CLI surface
    let config_path = std::env::var_os("TETHERD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yml"));
    let log_dir = config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let _guard = init_tracing(&log_dir);

    info!(config = %config_path.display(), "starting tetherd");
    agent_core::run(config_path).await?;
    Ok(())
}
