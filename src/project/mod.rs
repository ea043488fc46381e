// Project structure validation and mc.json manifest parsing.
mod manifest;
mod validate;

pub use manifest::{Manifest, ManifestError};
pub use validate::{validate_project, ValidationError};

// Fixed names of the project layout contract
pub const SERVICE_ENTRYPOINT: &str = "gogogo.py";
pub const MANIFEST_FILE: &str = "mc.json";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const MODEL_DIR: &str = "model";
pub const EXAMPLES_DIR: &str = "examples";
