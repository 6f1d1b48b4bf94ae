use std::sync::Arc;

use tether_types::TunnelSpec;
use tokio::net::TcpStream;
use tracing::{info, warn};

use super::{
    relay::relay_streams,
    traits::{ForwardedChannel, RemoteRegistrar},
};
use crate::error::EngineError;

type Result<T> = crate::EngineResult<T>;

/// One registered remote listener and the local target it forwards to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteBinding {
    /// Port requested from the server.
    pub requested_port: u16,
    /// Port the server actually bound (differs when the server assigns one).
    pub actual_port: u32,
    /// Local address accepted connections are dialed to.
    pub local_ip: String,
    /// Local port accepted connections are dialed to.
    pub local_port: u16,
}

#[derive(Default)]
struct RegistryState {
    specs: Vec<TunnelSpec>,
    bindings: tokio::sync::Mutex<Vec<RemoteBinding>>,
}

/// Tracks the remote listeners of one transport session and dispatches
/// accepted connections to their local targets.
///
/// Cheap to clone; all clones share the same binding table. A registry is
/// only ever live on one session at a time; re-registering after a
/// reconnect replaces every previous binding.
#[derive(Clone, Default)]
pub struct TunnelRegistry {
    state: Arc<RegistryState>,
}

impl TunnelRegistry {
    /// Create a registry for the given tunnel specs.
    pub fn new(specs: Vec<TunnelSpec>) -> Self {
        Self {
            state: Arc::new(RegistryState {
                specs,
                bindings: tokio::sync::Mutex::new(Vec::new()),
            }),
        }
    }

    /// The tunnel specs this registry was built from.
    pub fn specs(&self) -> &[TunnelSpec] {
        &self.state.specs
    }

    /// Human-readable descriptors of the configured tunnels.
    pub fn descriptors(&self) -> Vec<String> {
        self.state
            .specs
            .iter()
            .map(|spec| {
                format!(
                    "remote localhost:{} -> {}",
                    spec.remote_port,
                    spec.local_address()
                )
            })
            .collect()
    }

    /// Currently recorded bindings.
    pub async fn bindings(&self) -> Vec<RemoteBinding> {
        self.state.bindings.lock().await.clone()
    }

    /// Register one remote listener per configured tunnel spec.
    ///
    /// Bindings from a previous session are discarded first, so a spec
    /// never has more than one live registration.
    pub async fn register_all<R>(&self, session: &mut R) -> Result<()>
    where
        R: RemoteRegistrar + Send,
    {
        let mut bindings = self.state.bindings.lock().await;
        bindings.clear();
        for spec in &self.state.specs {
            let requested = spec.remote_port;
            let assigned = session
                .request_tcpip_forward("localhost".to_string(), requested)
                .await
                .map_err(|source| EngineError::ListenRequest {
                    port: requested,
                    source: Box::new(source),
                })?;
            let actual_port = if assigned != 0 {
                assigned
            } else {
                requested as u32
            };
            info!(
                remote = %format!("localhost:{actual_port}"),
                target = %spec.local_address(),
                "remote tunnel registered"
            );
            bindings.push(RemoteBinding {
                requested_port: requested,
                actual_port,
                local_ip: spec.local_ip.clone(),
                local_port: spec.local_port,
            });
        }
        Ok(())
    }

    /// Resolve the local target for a connection accepted on `bound_port`.
    pub async fn resolve(&self, bound_port: u32) -> Option<(String, u16)> {
        let bindings = self.state.bindings.lock().await;
        bindings
            .iter()
            .find(|entry| entry.actual_port == bound_port)
            .map(|entry| (entry.local_ip.clone(), entry.local_port))
    }

    /// Handle one accepted remote connection: dial the local target and
    /// relay until either side closes.
    ///
    /// A dial failure closes the accepted connection and affects nothing
    /// else; the remote listener keeps accepting.
    pub async fn handle_forwarded_channel<C>(
        &self,
        channel: C,
        connected_address: &str,
        connected_port: u32,
        originator: &str,
    ) -> Result<()>
    where
        C: ForwardedChannel,
    {
        let Some((local_ip, local_port)) = self.resolve(connected_port).await else {
            warn!(
                address = connected_address,
                port = connected_port,
                "received forwarded connection with no matching tunnel"
            );
            let _ = channel.close().await;
            return Ok(());
        };
        info!(
            remote = %format!("{connected_address}:{connected_port}"),
            target = %format!("{local_ip}:{local_port}"),
            origin = originator,
            "forwarding remote connection"
        );
        let remote_stream = channel.into_stream();
        let address = format!("{local_ip}:{local_port}");
        let local_stream = match TcpStream::connect(address.as_str()).await {
            Ok(stream) => stream,
            // dropping the channel stream closes the accepted connection
            Err(source) => return Err(EngineError::LocalDial { address, source }),
        };
        local_stream.set_nodelay(true).ok();
        relay_streams(remote_stream, local_stream).await
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
