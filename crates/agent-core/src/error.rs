use thiserror::Error;

use tether_types::ConfigError;
use tunnel_core::EngineError;

/// Errors that can occur in the agent runtime.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration could not be loaded
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Tunnel engine error
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// SSH protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication failed
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Host key verification failed
    #[error("host key verification failed: {0}")]
    HostKeyFailed(String),

    /// Transport dial timed out
    #[error("connection to {0} timed out")]
    ConnectTimeout(String),

    /// Config watcher error
    #[error("config watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;
