use russh::{
    Channel,
    client::{Msg, Session},
    keys::{HashAlg, PublicKey},
};
use tether_types::HostKeyMode;
use tracing::warn;
use tunnel_core::forwarding::TunnelRegistry;

/// Client-side event handler for one transport session: applies the host
/// key policy and dispatches accepted `forwarded-tcpip` channels to the
/// tunnel registry.
#[derive(Clone)]
pub struct AgentHandler {
    host_key: HostKeyMode,
    registry: TunnelRegistry,
}

impl AgentHandler {
    pub fn new(host_key: HostKeyMode, registry: TunnelRegistry) -> Self {
        Self { host_key, registry }
    }
}

impl russh::client::Handler for AgentHandler {
    type Error = crate::AgentError;

    fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> impl std::future::Future<Output = std::result::Result<bool, Self::Error>> + Send {
        let mode = self.host_key.clone();
        let presented = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        async move {
            match mode {
                HostKeyMode::Insecure => {
                    warn!(
                        fingerprint = %presented,
                        "accepting unverified host key (host_key = insecure)"
                    );
                    Ok(true)
                }
                HostKeyMode::Pinned(expected) => {
                    if presented == expected {
                        Ok(true)
                    } else {
                        Err(crate::AgentError::HostKeyFailed(format!(
                            "pinned {expected}, server presented {presented}"
                        )))
                    }
                }
            }
        }
    }

    fn server_channel_open_forwarded_tcpip(
        &mut self,
        channel: Channel<Msg>,
        connected_address: &str,
        connected_port: u32,
        originator_address: &str,
        originator_port: u32,
        _session: &mut Session,
    ) -> impl std::future::Future<Output = std::result::Result<(), Self::Error>> + Send {
        let registry = self.registry.clone();
        let connected_address = connected_address.to_string();
        let originator = format!("{originator_address}:{originator_port}");
        async move {
            // each accepted connection forwards on its own task so the
            // session keeps accepting while relays are in flight
            tokio::spawn(async move {
                if let Err(err) = registry
                    .handle_forwarded_channel(channel, &connected_address, connected_port, &originator)
                    .await
                {
                    warn!(?err, "remote forwarded connection failed");
                }
            });
            Ok(())
        }
    }
}
