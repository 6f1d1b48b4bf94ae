//! The session supervisor: the system's top-level recovery loop.

use std::{sync::Arc, time::Duration};

use russh::client;
use tether_types::SshConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tunnel_core::{forwarding::TunnelRegistry, session};

use crate::{auth, error::AgentResult, handler::AgentHandler};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How one session attempt ended.
enum SessionEnd {
    /// The transport dropped out from under us.
    Died,
    /// Shutdown was requested while the session was live.
    Cancelled,
}

/// Build a session, register every tunnel, block until the transport dies,
/// tear down, wait, try again. Runs until the shutdown token fires; every
/// failure short of that is retried at the configured fixed interval.
pub async fn run(config: SshConfig, shutdown: CancellationToken) {
    let retry = config.retry_policy();
    let mut attempt: u32 = 0;
    loop {
        match serve_session(&config, &shutdown).await {
            Ok(SessionEnd::Cancelled) => {
                info!("session supervisor stopped");
                return;
            }
            Ok(SessionEnd::Died) => {
                warn!(
                    delay = ?retry.next_delay(attempt),
                    "SSH connection lost; reconnecting"
                );
            }
            Err(err) => {
                warn!(
                    error = %err,
                    delay = ?retry.next_delay(attempt),
                    "failed to establish SSH session; retrying"
                );
            }
        }
        tokio::select! {
            _ = tokio::time::sleep(retry.next_delay(attempt)) => {}
            _ = shutdown.cancelled() => {
                info!("session supervisor stopped");
                return;
            }
        }
        attempt = attempt.wrapping_add(1);
    }
}

/// One full session lifecycle: dial, authenticate, register tunnels, wait
/// for death.
async fn serve_session(
    config: &SshConfig,
    shutdown: &CancellationToken,
) -> AgentResult<SessionEnd> {
    let key = auth::load_private_key(&config.private_key).await?;
    let registry = TunnelRegistry::new(config.tunnels.clone());
    let handler = AgentHandler::new(config.host_key.clone(), registry.clone());

    let target = format!("{}:{}", config.host, config.port);
    info!(target = %target, user = %config.user, "connecting");
    let ssh_config = Arc::new(session::client_config());
    let connect = client::connect(ssh_config, (config.host.as_str(), config.port), handler);
    let mut session = match tokio::time::timeout(CONNECT_TIMEOUT, connect).await {
        Ok(session) => session?,
        Err(_) => return Err(crate::AgentError::ConnectTimeout(target)),
    };
    auth::authenticate(&mut session, &config.user, key).await?;

    registry.register_all(&mut session).await?;
    info!(
        tunnels = %registry.descriptors().join(", "),
        "session established"
    );

    let death = session::wait_closed(session);
    tokio::pin!(death);
    tokio::select! {
        _ = &mut death => Ok(SessionEnd::Died),
        _ = shutdown.cancelled() => {
            // dropping the pending wait drops the session handle, which
            // tears the transport (and every remote listener) down with it
            Ok(SessionEnd::Cancelled)
        }
    }
}
