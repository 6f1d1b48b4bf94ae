//! Agent runtime: key authentication, the session supervisor reconnect
//! loop, and config-driven reload.

pub mod auth;
pub mod config;
pub mod error;
mod handler;
pub mod reload;
pub mod supervisor;

use std::path::PathBuf;

pub use error::{AgentError, AgentResult};
pub use handler::AgentHandler;
use tracing::info;

/// Run the agent under the configuration at `config_path` until the
/// process is terminated.
///
/// Returns early only when the initial configuration cannot be loaded or
/// the config watcher cannot be installed; everything past that point is
/// retried forever.
pub async fn run(config_path: PathBuf) -> AgentResult<()> {
    let config = config::load_config(&config_path)?;
    info!(
        config = %config_path.display(),
        tunnels = config.ssh.tunnels.len(),
        "configuration loaded"
    );
    reload::run(config_path, config).await
}
