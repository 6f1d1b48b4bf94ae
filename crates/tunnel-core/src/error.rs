use thiserror::Error;

/// Errors that can occur in the tunnel engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// SSH protocol error
    #[error("SSH protocol error: {0}")]
    Ssh(#[from] russh::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote listen request failed
    #[error("remote listen request for port {port} failed: {source}")]
    ListenRequest {
        port: u16,
        #[source]
        source: Box<EngineError>,
    },

    /// Local target unreachable for one connection
    #[error("failed to connect to local target {address}: {source}")]
    LocalDial {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for tunnel engine operations
pub type EngineResult<T> = Result<T, EngineError>;
