use crate::config::ConfigError;
use crate::docker::template::TemplateError;
use crate::project::ValidationError;
use thiserror::Error;

/// Everything that can go wrong while driving the Docker engine.
///
/// Connectivity failures are split by endpoint: the local engine and the
/// configured remote server get distinct variants so the command layer can
/// print the right hint for each.
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("cannot connect to the Docker daemon: {0}")]
    DaemonUnreachable(String),
    #[error("cannot connect to the remote Docker server at {host}: {message}")]
    RemoteUnreachable { host: String, message: String },
    /// Failure reported by the engine itself; the message is passed through
    /// verbatim
    #[error("{0}")]
    Engine(String),
    #[error("no inoyb images found to push; run `inoyb build` first")]
    NoImageToPush,
    #[error("failed to prepare build context: {0}")]
    BuildContext(#[source] std::io::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DockerError {
    /// True when the error points at an unreachable engine endpoint, local
    /// or remote. The command layer uses this to attach a connectivity hint.
    pub fn is_connectivity(&self) -> bool {
        match self {
            DockerError::DaemonUnreachable(_) | DockerError::RemoteUnreachable { .. } => true,
            DockerError::Engine(message) => {
                message.contains("Cannot connect to the Docker daemon")
                    || message.contains("connection refused")
                    || message.contains("Connection refused")
            }
            _ => false,
        }
    }
}
