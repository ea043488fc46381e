// Docker engine integration: image building, listing, retention and
// transfer to a remote server. All actual image work is delegated to the
// engine through its HTTP API.
mod builder;
mod error;
mod manager;
mod naming;
mod template;

pub use builder::{ImageBuilder, ImageRecord};
pub use error::DockerError;
pub use manager::DockerManager;
