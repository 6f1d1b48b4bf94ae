//! Shared type definitions for tether.
//!
//! This crate contains the configuration document, tunnel specifications,
//! and policy types shared by the forwarding engine and the agent runtime.
//! It is intentionally dependency-light so it can be reused without pulling
//! in protocol implementations.

pub mod config;
pub mod retry;

pub use config::{ConfigError, HostKeyMode, SshConfig, TetherConfig, TunnelSpec};
pub use retry::RetryPolicy;
