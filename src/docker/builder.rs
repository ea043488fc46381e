use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bollard::image::{BuildImageOptions, ListImagesOptions, RemoveImageOptions};
use bollard::models::ImageSummary;
use bollard::Docker;
use colored::*;
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::docker::error::DockerError;
use crate::docker::naming::{generate_image_name, namespaced, project_key, IMAGE_NAMESPACE};
use crate::docker::template::render_dockerfile;
use crate::project::validate_project;

/// Name of the rendered Dockerfile dropped into the project for the build
const DOCKERFILE_NAME: &str = "Dockerfile.inoyb";

/// A locally stored image built by this tool
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Full repository tag, e.g. `inoyb/flood-model-1a2b3c4d`
    pub name: String,
    /// Short content id (12 hex chars)
    pub id: String,
    /// Creation time, seconds since the epoch
    pub created: i64,
    /// Size in bytes
    pub size: i64,
}

/// Removes the rendered Dockerfile when the build scope ends, success or not
struct DockerfileGuard {
    path: PathBuf,
}

impl Drop for DockerfileGuard {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("Could not remove {}: {}", self.path.display(), e);
            } else {
                debug!("Removed temporary {}", self.path.display());
            }
        }
    }
}

/// Builds and manages images through the local Docker engine.
///
/// Construction connects to the engine and pings it, so a missing or stopped
/// daemon is reported before any command-specific work starts.
pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    /// Connect to the local engine and verify it responds.
    pub async fn new() -> Result<Self, DockerError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| DockerError::DaemonUnreachable(e.to_string()))?;
        docker
            .ping()
            .await
            .map_err(|e| DockerError::DaemonUnreachable(e.to_string()))?;
        Ok(ImageBuilder { docker })
    }

    pub(crate) fn client(&self) -> &Docker {
        &self.docker
    }

    /// Validate the project, render its Dockerfile and build a freshly
    /// tagged image. Returns the full tag and the short image id.
    pub async fn build_image(
        &self,
        project_path: &Path,
        use_gpu: bool,
    ) -> Result<(String, String), DockerError> {
        let project_path = project_path
            .canonicalize()
            .map_err(DockerError::BuildContext)?;

        info!("Building image from {}", project_path.display());

        let (manifest, has_examples) = validate_project(&project_path)?;

        let image_name = generate_image_name(manifest.model_name());
        let full_name = namespaced(&image_name);
        info!("Image tag: {}", full_name);

        let dockerfile = render_dockerfile(&project_path, has_examples, use_gpu)?;
        let dockerfile_path = project_path.join(DOCKERFILE_NAME);
        std::fs::write(&dockerfile_path, dockerfile).map_err(DockerError::BuildContext)?;
        let _guard = DockerfileGuard {
            path: dockerfile_path,
        };

        let context = build_context_tar(&project_path)?;

        let options = BuildImageOptions::<String> {
            dockerfile: DOCKERFILE_NAME.to_string(),
            t: full_name.clone(),
            // Drop intermediate containers and refresh the base image
            rm: true,
            pull: true,
            ..Default::default()
        };

        let mut stream = self
            .docker
            .build_image(options, None, Some(context.into()));

        while let Some(item) = stream.next().await {
            let update = item.map_err(|e| DockerError::Engine(e.to_string()))?;
            if let Some(message) = update.error {
                return Err(DockerError::Engine(message));
            }
            if let Some(line) = update.stream {
                let line = line.trim_end();
                if !line.is_empty() {
                    info!("{}", line);
                    println!("   {}", line.dimmed());
                }
            }
        }

        let inspect = self
            .docker
            .inspect_image(&full_name)
            .await
            .map_err(|e| DockerError::Engine(e.to_string()))?;
        let image_id = short_id(inspect.id.as_deref().unwrap_or_default());

        info!("Image built: {} ({})", full_name, image_id);
        Ok((full_name, image_id))
    }

    /// Local images under the tool's namespace, newest first. An optional
    /// substring filter narrows the result. Engine errors are logged and
    /// yield an empty list.
    pub async fn list_local_images(&self, filter: Option<&str>) -> Vec<ImageRecord> {
        let options = ListImagesOptions::<String> {
            all: false,
            ..Default::default()
        };

        let summaries = match self.docker.list_images(Some(options)).await {
            Ok(summaries) => summaries,
            Err(e) => {
                error!("Could not list images: {}", e);
                return Vec::new();
            }
        };

        records_from_summaries(summaries, filter)
    }

    /// Force-remove one image. Failures are logged and reported as `false`
    /// so callers can decide whether they are fatal.
    pub async fn remove_image(&self, image_name: &str) -> bool {
        let options = RemoveImageOptions {
            force: true,
            ..Default::default()
        };
        match self.docker.remove_image(image_name, Some(options), None).await {
            Ok(_) => {
                info!("Removed image {}", image_name);
                true
            }
            Err(e) => {
                error!("Could not remove image {}: {}", image_name, e);
                false
            }
        }
    }

    /// Prune old images, keeping the newest `keep_count` per project.
    /// Removals are best-effort; the count of successful removals is
    /// returned.
    pub async fn cleanup_old_images(&self, keep_count: usize) -> usize {
        let images = self.list_local_images(None).await;
        let to_remove = plan_cleanup(&images, keep_count);

        let mut removed = 0;
        for record in to_remove {
            if self.remove_image(&record.name).await {
                removed += 1;
            }
        }
        removed
    }
}

/// Filter engine image summaries down to this tool's namespace, sorted
/// newest first. Shared between local and remote listings.
pub(crate) fn records_from_summaries(
    summaries: Vec<ImageSummary>,
    filter: Option<&str>,
) -> Vec<ImageRecord> {
    let prefix = format!("{}/", IMAGE_NAMESPACE);
    let mut records = Vec::new();
    for summary in summaries {
        for tag in &summary.repo_tags {
            if !tag.starts_with(&prefix) {
                continue;
            }
            if let Some(needle) = filter {
                if !tag.contains(needle) {
                    continue;
                }
            }
            records.push(ImageRecord {
                name: tag.clone(),
                id: short_id(&summary.id),
                created: summary.created,
                size: summary.size,
            });
        }
    }

    records.sort_by(|a, b| b.created.cmp(&a.created));
    records
}

/// Decide which images a prune should delete.
///
/// Images are grouped by inferred project; within each group the newest
/// `keep_count` survive and the rest are returned, oldest last, matching the
/// removal order. Tags without a recognizable suffix are never pruned.
pub(crate) fn plan_cleanup(images: &[ImageRecord], keep_count: usize) -> Vec<ImageRecord> {
    let mut groups: HashMap<String, Vec<&ImageRecord>> = HashMap::new();
    for record in images {
        if let Some(key) = project_key(&record.name) {
            groups.entry(key).or_default().push(record);
        }
    }

    let mut to_remove = Vec::new();
    for (_, mut members) in groups {
        members.sort_by(|a, b| b.created.cmp(&a.created));
        if members.len() > keep_count {
            to_remove.extend(members[keep_count..].iter().map(|r| (*r).clone()));
        }
    }
    to_remove
}

/// Tar up the project directory as the engine build context. The rendered
/// Dockerfile is already inside the directory at this point.
fn build_context_tar(project_path: &Path) -> Result<Vec<u8>, DockerError> {
    let mut builder = tar::Builder::new(Vec::new());
    builder
        .append_dir_all(".", project_path)
        .map_err(DockerError::BuildContext)?;
    builder.into_inner().map_err(DockerError::BuildContext)
}

/// `sha256:abcdef...` → `abcdef...` truncated to 12 chars
fn short_id(id: &str) -> String {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    id.chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, created: i64) -> ImageRecord {
        ImageRecord {
            name: name.to_string(),
            id: "0123456789ab".to_string(),
            created,
            size: 1024,
        }
    }

    #[test]
    fn prune_removes_oldest_beyond_keep_count() {
        let images = vec![
            record("inoyb/flood-model-aaaaaaaa", 500),
            record("inoyb/flood-model-bbbbbbbb", 400),
            record("inoyb/flood-model-cccccccc", 300),
            record("inoyb/flood-model-dddddddd", 200),
            record("inoyb/flood-model-eeeeeeee", 100),
        ];

        let removals = plan_cleanup(&images, 3);
        let mut names: Vec<_> = removals.iter().map(|r| r.name.as_str()).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["inoyb/flood-model-dddddddd", "inoyb/flood-model-eeeeeeee"]
        );
    }

    #[test]
    fn prune_keeps_groups_at_or_under_threshold() {
        let images = vec![
            record("inoyb/flood-model-aaaaaaaa", 500),
            record("inoyb/flood-model-bbbbbbbb", 400),
        ];
        assert!(plan_cleanup(&images, 3).is_empty());
        assert!(plan_cleanup(&images, 2).is_empty());
    }

    #[test]
    fn prune_groups_projects_independently() {
        let images = vec![
            record("inoyb/flood-model-aaaaaaaa", 500),
            record("inoyb/flood-model-bbbbbbbb", 400),
            record("inoyb/flood-model-cccccccc", 300),
            record("inoyb/drought-model-dddddddd", 200),
        ];

        let removals = plan_cleanup(&images, 2);
        assert_eq!(removals.len(), 1);
        assert_eq!(removals[0].name, "inoyb/flood-model-cccccccc");
    }

    #[test]
    fn prune_ignores_unsuffixed_tags() {
        let images = vec![record("inoyb/plain", 500), record("inoyb/plain", 400)];
        assert!(plan_cleanup(&images, 0).is_empty());
    }

    #[test]
    fn prune_sorts_within_group_regardless_of_input_order() {
        let images = vec![
            record("inoyb/m-aaaaaaaa", 100),
            record("inoyb/m-bbbbbbbb", 300),
            record("inoyb/m-cccccccc", 200),
        ];
        let removals = plan_cleanup(&images, 1);
        let mut names: Vec<_> = removals.iter().map(|r| r.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["inoyb/m-aaaaaaaa", "inoyb/m-cccccccc"]);
    }

    #[test]
    fn short_id_strips_digest_prefix() {
        assert_eq!(
            short_id("sha256:0123456789abcdef0123456789abcdef"),
            "0123456789ab"
        );
        assert_eq!(short_id("0123456789ab"), "0123456789ab");
    }
}
