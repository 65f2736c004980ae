use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("{binary} not found on PATH")]
    NotFound { binary: String },

    #[error("{name} exited during startup ({status})")]
    ExitedEarly { name: String, status: String },

    #[error("{name} did not become ready within {secs}s")]
    NotReady { name: String, secs: u64 },

    #[error("{name} failed: {detail}")]
    CommandFailed { name: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DaemonError>;
