//! Reverse tunnel forwarding.
//!
//! One [`TunnelRegistry`] owns the remote listeners registered on a
//! transport session and resolves accepted `forwarded-tcpip` channels back
//! to the local target they tunnel to. The registry is driven through the
//! traits in this module so tests can exercise it without a live SSH
//! server.

mod registry;
mod relay;
mod traits;

pub use registry::{RemoteBinding, TunnelRegistry};
pub use relay::relay_streams;
pub use traits::{ForwardedChannel, RemoteRegistrar};
