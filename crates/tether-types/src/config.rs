//! Configuration document for the tunnel agent.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("unable to read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid YAML or is missing required fields
    #[error("malformed config document: {0}")]
    Malformed(#[from] serde_yaml::Error),

    /// Document parsed but fails validation
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn empty(field: &str) -> Self {
        ConfigError::Invalid(format!("{field} must not be empty"))
    }
}

/// Top-level configuration document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TetherConfig {
    /// SSH endpoint and tunnel definitions.
    #[serde(rename = "ssh_config")]
    pub ssh: SshConfig,
}

/// One SSH endpoint identity and the tunnels to keep open through it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfig {
    /// Remote host to connect to.
    pub host: String,
    /// SSH port on the remote host.
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// Username to authenticate as.
    pub user: String,
    /// Path to the (unencrypted) private key file.
    pub private_key: PathBuf,
    /// Host key acceptance policy.
    #[serde(default)]
    pub host_key: HostKeyMode,
    /// Seconds to wait between reconnect attempts.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Reverse tunnels to request from the server.
    pub tunnels: Vec<TunnelSpec>,
}

impl SshConfig {
    /// Reconnect policy derived from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(Duration::from_secs(self.retry_delay_secs))
    }
}

/// One reverse tunnel: a remote port requested from the server and the
/// local address connections are forwarded to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelSpec {
    /// Local address to forward accepted connections to.
    #[serde(default = "default_local_ip")]
    pub local_ip: String,
    /// Local port to forward accepted connections to.
    pub local_port: u16,
    /// Port the remote host should listen on.
    pub remote_port: u16,
}

impl TunnelSpec {
    /// The local target as a dialable `host:port` string.
    pub fn local_address(&self) -> String {
        format!("{}:{}", self.local_ip, self.local_port)
    }
}

/// Host key acceptance policy.
///
/// `Insecure` accepts whatever key the server presents, matching classic
/// unattended-tunnel behavior; the risk is the operator's to take, and it
/// is logged on every connection. `Pinned` compares the presented key's
/// SHA256 fingerprint against a configured value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HostKeyMode {
    /// Accept any host key.
    #[default]
    Insecure,
    /// Require the given SHA256 fingerprint (e.g. `SHA256:Uy5K...`).
    Pinned(String),
}

impl TryFrom<String> for HostKeyMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "insecure" {
            return Ok(HostKeyMode::Insecure);
        }
        if let Some(fingerprint) = value.strip_prefix("pinned:") {
            if fingerprint.is_empty() {
                return Err("pinned host key requires a fingerprint".to_string());
            }
            return Ok(HostKeyMode::Pinned(fingerprint.to_string()));
        }
        Err(format!(
            "unknown host_key mode {value:?}; expected \"insecure\" or \"pinned:<fingerprint>\""
        ))
    }
}

impl From<HostKeyMode> for String {
    fn from(mode: HostKeyMode) -> Self {
        match mode {
            HostKeyMode::Insecure => "insecure".to_string(),
            HostKeyMode::Pinned(fingerprint) => format!("pinned:{fingerprint}"),
        }
    }
}

impl TetherConfig {
    /// Parse and validate a configuration document.
    ///
    /// Either a complete configuration comes back or an error; a document
    /// that fails validation never escapes partially populated.
    pub fn from_yaml(data: &str) -> Result<Self, ConfigError> {
        let config: TetherConfig = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ssh = &self.ssh;
        if ssh.host.is_empty() {
            return Err(ConfigError::empty("host"));
        }
        if ssh.user.is_empty() {
            return Err(ConfigError::empty("user"));
        }
        if ssh.private_key.as_os_str().is_empty() {
            return Err(ConfigError::empty("private_key"));
        }
        if ssh.port == 0 {
            return Err(ConfigError::Invalid("port must be nonzero".to_string()));
        }
        if ssh.tunnels.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one tunnel must be configured".to_string(),
            ));
        }
        for (index, tunnel) in ssh.tunnels.iter().enumerate() {
            if tunnel.local_ip.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "tunnel {index}: local_ip must not be empty"
                )));
            }
            if tunnel.local_port == 0 || tunnel.remote_port == 0 {
                return Err(ConfigError::Invalid(format!(
                    "tunnel {index}: ports must be nonzero"
                )));
            }
        }
        Ok(())
    }
}

fn default_ssh_port() -> u16 {
    22
}

fn default_local_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_retry_delay_secs() -> u64 {
    10
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
