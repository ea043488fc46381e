use bollard::image::ImportImageOptions;
use bollard::{Docker, API_DEFAULT_VERSION};
use futures::StreamExt;
use tracing::{debug, info};

use crate::config::DockerConfig;
use crate::docker::builder::{ImageBuilder, ImageRecord};
use crate::docker::error::DockerError;

/// Seconds bollard waits for the remote endpoint; matches its own default
const REMOTE_TIMEOUT_SECS: u64 = 120;

/// Transfers images from the local engine to the configured remote server.
pub struct DockerManager {
    local: ImageBuilder,
    config: DockerConfig,
}

impl DockerManager {
    /// Connect to the local engine and load the configuration.
    pub async fn new() -> Result<Self, DockerError> {
        let local = ImageBuilder::new().await?;
        let config = DockerConfig::load()?;
        Ok(DockerManager { local, config })
    }

    /// Push an image to the configured remote Docker server.
    ///
    /// With no explicit name the most recently built namespaced image is
    /// used. The transfer exports the image from the local engine and loads
    /// it into the remote one; an unreachable remote is its own error,
    /// distinct from local daemon failures.
    pub async fn push_image(&self, image: Option<&str>) -> Result<String, DockerError> {
        let image_name = match image {
            Some(name) => name.to_string(),
            None => self
                .newest_local_image()
                .await
                .ok_or(DockerError::NoImageToPush)?,
        };

        info!("Pushing {} to {}", image_name, self.config.docker_host());

        let remote = self.connect_remote().await?;

        // Export from the local engine into memory, then load remotely.
        let mut export = self.local.client().export_image(&image_name);
        let mut archive: Vec<u8> = Vec::new();
        while let Some(chunk) = export.next().await {
            let chunk = chunk.map_err(|e| DockerError::Engine(e.to_string()))?;
            archive.extend_from_slice(&chunk);
        }
        debug!("Exported {} ({} bytes)", image_name, archive.len());

        let options = ImportImageOptions { quiet: false };
        let mut load = remote.import_image(options, archive.into(), None);
        while let Some(item) = load.next().await {
            let update = item.map_err(|e| DockerError::Engine(e.to_string()))?;
            if let Some(message) = update.error {
                return Err(DockerError::Engine(message));
            }
            if let Some(line) = update.stream {
                debug!("{}", line.trim_end());
            }
        }

        info!("Pushed {} successfully", image_name);
        Ok(image_name)
    }

    /// Namespaced images present on the remote server, newest first.
    pub async fn list_remote_images(&self) -> Result<Vec<ImageRecord>, DockerError> {
        let remote = self.connect_remote().await?;
        let summaries = remote
            .list_images(Some(bollard::image::ListImagesOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await
            .map_err(|e| DockerError::Engine(e.to_string()))?;
        Ok(super::builder::records_from_summaries(summaries, None))
    }

    async fn newest_local_image(&self) -> Option<String> {
        self.local
            .list_local_images(None)
            .await
            .into_iter()
            .next()
            .map(|record| record.name)
    }

    /// Connect to the configured remote server and verify it responds.
    async fn connect_remote(&self) -> Result<Docker, DockerError> {
        let host = self.config.docker_host().to_string();
        // bollard speaks HTTP; accept the conventional tcp:// spelling too
        let addr = host.replace("tcp://", "http://");

        let remote = Docker::connect_with_http(&addr, REMOTE_TIMEOUT_SECS, API_DEFAULT_VERSION)
            .map_err(|e| DockerError::RemoteUnreachable {
                host: host.clone(),
                message: e.to_string(),
            })?;
        remote
            .ping()
            .await
            .map_err(|e| DockerError::RemoteUnreachable {
                host,
                message: e.to_string(),
            })?;
        Ok(remote)
    }
}
