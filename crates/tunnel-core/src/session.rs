//! Transport session helpers.
//!
//! A session is one authenticated connection to the remote host and the
//! unit of reconnection: every remote listener registered through it
//! becomes unusable the instant the underlying connection drops.

use std::time::Duration;

use russh::client::{self, Handle};
use tracing::debug;

/// Handle to one authenticated SSH transport session.
pub type SessionHandle<H> = Handle<H>;

/// Client configuration shared by every transport session.
///
/// Keepalives are on so silently dropped connections surface as session
/// death instead of leaving the supervisor blocked on a dead socket.
pub fn client_config() -> client::Config {
    client::Config {
        inactivity_timeout: None,
        keepalive_interval: Some(Duration::from_secs(30)),
        keepalive_max: 3,
        ..Default::default()
    }
}

/// Block until the session's underlying connection terminates.
///
/// Consumes the handle; dropping the returned future before completion
/// drops the handle and tears the transport down with it, which is how
/// cancellation closes a live session.
pub async fn wait_closed<H>(session: SessionHandle<H>)
where
    H: client::Handler + Send,
    H::Error: std::fmt::Debug,
{
    if let Err(err) = session.await {
        debug!(?err, "SSH session closed with error");
    }
}
