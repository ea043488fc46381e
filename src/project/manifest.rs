use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Reasons an mc.json file can be rejected. Each shape problem gets its own
/// variant so the user sees exactly what to fix.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read mc.json: {0}")]
    Unreadable(#[source] std::io::Error),
    #[error("mc.json is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("mc.json root element must be an object")]
    RootNotObject,
    #[error("mc.json is missing the model_info field")]
    MissingModelInfo,
    #[error("mc.json model_info must be an object")]
    ModelInfoNotObject,
    #[error("mc.json is missing the model_info.name field")]
    MissingModelName,
    #[error("mc.json model_info.name must be a string")]
    ModelNameNotString,
    #[error("mc.json model_info.name must be a non-empty string")]
    ModelNameEmpty,
}

/// A parsed and structurally verified mc.json.
///
/// Only `model_info.name` is interpreted by this tool; the rest of the
/// document is kept as-is for callers that want to inspect it.
#[derive(Debug, Clone)]
pub struct Manifest {
    model_name: String,
    raw: Value,
}

impl Manifest {
    /// Read and verify the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(ManifestError::Unreadable)?;
        let raw: Value = serde_json::from_str(&contents).map_err(ManifestError::InvalidJson)?;

        let root = raw.as_object().ok_or(ManifestError::RootNotObject)?;
        let model_info = root
            .get("model_info")
            .ok_or(ManifestError::MissingModelInfo)?;
        let model_info = model_info
            .as_object()
            .ok_or(ManifestError::ModelInfoNotObject)?;
        let name = model_info
            .get("name")
            .ok_or(ManifestError::MissingModelName)?;
        let name = name.as_str().ok_or(ManifestError::ModelNameNotString)?;
        if name.trim().is_empty() {
            return Err(ManifestError::ModelNameEmpty);
        }

        Ok(Manifest {
            model_name: name.to_string(),
            raw,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// The full document, for fields this tool does not interpret
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}
