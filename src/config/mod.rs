// Persistent tool configuration, stored as JSON under the user's home directory.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Server address used when no override has been configured
pub const DEFAULT_SERVER: &str = "tcp://docker.inoyb.com:2376";
/// Registry prefix images are published under
pub const DEFAULT_REGISTRY: &str = "registry.inoyb.com/inoyb";
/// How many images per project `images clean` keeps by default
pub const DEFAULT_KEEP_IMAGES: usize = 3;

/// Errors raised while loading or persisting the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Named registries images can be pushed to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Registry prefix used when no explicit target is given
    pub default: String,
}

/// Retention settings for `images clean`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSettings {
    /// Number of images kept per project when pruning
    pub keep_images: usize,
    /// Whether old images are pruned automatically after a build
    pub auto_cleanup: bool,
}

/// The `docker` section of the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerSettings {
    /// Built-in server address, never mutated
    pub default_server: String,
    /// User override; `None` means the default server is in effect
    pub current_server: Option<String>,
    pub registries: RegistrySettings,
    pub cleanup: CleanupSettings,
}

/// On-disk shape of `~/.inoyb/config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    docker: DockerSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConfigFile {
            docker: DockerSettings {
                default_server: DEFAULT_SERVER.to_string(),
                current_server: None,
                registries: RegistrySettings {
                    default: DEFAULT_REGISTRY.to_string(),
                },
                cleanup: CleanupSettings {
                    keep_images: DEFAULT_KEEP_IMAGES,
                    auto_cleanup: true,
                },
            },
        }
    }
}

/// Loads, queries and persists the tool configuration.
///
/// The file is created with defaults on first use. Every mutating method
/// writes the file back immediately, so no in-memory state outlives the
/// process.
pub struct DockerConfig {
    config_file: PathBuf,
    data: ConfigFile,
}

impl DockerConfig {
    /// Load the configuration from `~/.inoyb/config.json`, creating the
    /// directory if needed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = config_dir()?;
        Self::load_from(&config_dir.join("config.json"))
    }

    /// Load from an explicit path. An unreadable or malformed file falls
    /// back to defaults rather than failing the command.
    pub fn load_from(config_file: &Path) -> Result<Self, ConfigError> {
        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let data = match fs::read_to_string(config_file) {
            Ok(contents) => match serde_json::from_str::<ConfigFile>(&contents) {
                Ok(data) => data,
                Err(e) => {
                    warn!(
                        "Config file {} is malformed ({}), using defaults",
                        config_file.display(),
                        e
                    );
                    ConfigFile::default()
                }
            },
            Err(_) => ConfigFile::default(),
        };

        Ok(DockerConfig {
            config_file: config_file.to_path_buf(),
            data,
        })
    }

    fn save(&self) -> Result<(), ConfigError> {
        let serialized = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.config_file, serialized).map_err(|source| ConfigError::Write {
            path: self.config_file.clone(),
            source,
        })
    }

    /// Effective Docker server address: the override if set, otherwise the
    /// default server.
    pub fn docker_host(&self) -> &str {
        self.data
            .docker
            .current_server
            .as_deref()
            .unwrap_or(&self.data.docker.default_server)
    }

    /// Set the server override and persist.
    pub fn set_docker_host(&mut self, host: &str) -> Result<(), ConfigError> {
        self.data.docker.current_server = Some(host.to_string());
        self.save()
    }

    /// Clear the override, restoring the default server, and persist.
    pub fn use_default_server(&mut self) -> Result<(), ConfigError> {
        self.data.docker.current_server = None;
        self.save()
    }

    pub fn is_using_default_server(&self) -> bool {
        self.data.docker.current_server.is_none()
    }

    pub fn registry(&self) -> &str {
        &self.data.docker.registries.default
    }

    pub fn cleanup(&self) -> &CleanupSettings {
        &self.data.docker.cleanup
    }
}

/// `~/.inoyb`, created on demand
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    let dir = home.join(".inoyb");
    fs::create_dir_all(&dir).map_err(|source| ConfigError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
