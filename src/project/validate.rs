use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use super::manifest::{Manifest, ManifestError};
use super::{EXAMPLES_DIR, MANIFEST_FILE, MODEL_DIR, REQUIREMENTS_FILE, SERVICE_ENTRYPOINT};

/// Structural problems with a project directory
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One or more required entries are absent or of the wrong type. Every
    /// problem is collected before reporting so the user can fix them in one
    /// pass.
    #[error("project is missing required entries: {}", .0.join(", "))]
    MissingEntries(Vec<String>),
    /// A directory wraps a single same-named child directory, e.g.
    /// `model/model/`. Usually the result of unpacking an archive one level
    /// too deep.
    #[error("{dir}/ contains only a nested {dir}/ directory; move its contents up one level into {dir}/ directly")]
    NestedDirectory { dir: String },
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Check whether `directory` wraps a single child directory named `dir_name`.
///
/// Empty directories, multiple entries, or a single differently-named entry
/// all pass. A missing path passes too; existence is checked elsewhere.
fn has_redundant_nesting(directory: &Path, dir_name: &str) -> std::io::Result<bool> {
    if !directory.is_dir() {
        return Ok(false);
    }

    let entries: Vec<_> = std::fs::read_dir(directory)?.collect::<Result<_, _>>()?;
    if entries.len() != 1 {
        return Ok(false);
    }

    let only = &entries[0];
    Ok(only.path().is_dir() && only.file_name() == *dir_name)
}

/// Validate a candidate project directory.
///
/// Checks, in order: required entries (all problems collected), `model/`
/// contents, redundant nesting in `model/` and `examples/`, then the mc.json
/// manifest. Returns the parsed manifest and whether a usable `examples/`
/// directory is present.
pub fn validate_project(project_path: &Path) -> Result<(Manifest, bool), ValidationError> {
    info!("Validating project structure at {}", project_path.display());

    let required = [
        (SERVICE_ENTRYPOINT, false),
        (MANIFEST_FILE, false),
        (REQUIREMENTS_FILE, false),
        (MODEL_DIR, true),
    ];

    let mut missing = Vec::new();
    for (name, want_dir) in required {
        let path = project_path.join(name);
        if !path.exists() {
            missing.push(name.to_string());
        } else if path.is_dir() != want_dir {
            let kind = if want_dir { "not a directory" } else { "not a file" };
            missing.push(format!("{} ({})", name, kind));
        }
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingEntries(missing));
    }

    let model_dir = project_path.join(MODEL_DIR);
    let model_empty = std::fs::read_dir(&model_dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if model_empty {
        warn!("model/ directory is empty");
    }

    if has_redundant_nesting(&model_dir, MODEL_DIR).unwrap_or(false) {
        return Err(ValidationError::NestedDirectory {
            dir: MODEL_DIR.to_string(),
        });
    }

    // examples/ is optional: a directory is included in the image, anything
    // else is ignored with a warning
    let examples_dir = project_path.join(EXAMPLES_DIR);
    let mut has_examples = false;
    if examples_dir.exists() {
        if !examples_dir.is_dir() {
            warn!("examples exists but is not a directory; it will be ignored");
        } else {
            if has_redundant_nesting(&examples_dir, EXAMPLES_DIR).unwrap_or(false) {
                return Err(ValidationError::NestedDirectory {
                    dir: EXAMPLES_DIR.to_string(),
                });
            }
            has_examples = true;
            info!("examples/ directory found, it will be included in the image");
        }
    }

    let manifest = Manifest::load(&project_path.join(MANIFEST_FILE))?;

    info!(
        "Project structure OK: model '{}', examples: {}",
        manifest.model_name(),
        has_examples
    );

    Ok((manifest, has_examples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const MANIFEST: &str = r#"{"model_info": {"name": "Test Model"}}"#;

    /// A complete, valid project in a scratch directory
    fn valid_project() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("gogogo.py"), "print('hi')").unwrap();
        fs::write(dir.path().join("mc.json"), MANIFEST).unwrap();
        fs::write(dir.path().join("requirements.txt"), "gradio\n").unwrap();
        fs::create_dir(dir.path().join("model")).unwrap();
        fs::write(dir.path().join("model/weights.bin"), b"\x00").unwrap();
        dir
    }

    #[test]
    fn complete_project_passes() {
        let dir = valid_project();
        let (manifest, has_examples) = validate_project(dir.path()).unwrap();
        assert_eq!(manifest.model_name(), "Test Model");
        assert!(!has_examples);
    }

    #[test]
    fn all_missing_entries_are_reported_together() {
        let dir = tempdir().unwrap();
        let err = validate_project(dir.path()).unwrap_err();
        match err {
            ValidationError::MissingEntries(entries) => {
                assert_eq!(
                    entries,
                    vec!["gogogo.py", "mc.json", "requirements.txt", "model"]
                );
            }
            other => panic!("expected MissingEntries, got {other:?}"),
        }
    }

    #[test]
    fn missing_requirements_is_named_specifically() {
        let dir = valid_project();
        fs::remove_file(dir.path().join("requirements.txt")).unwrap();
        let err = validate_project(dir.path()).unwrap_err();
        match err {
            ValidationError::MissingEntries(entries) => {
                assert_eq!(entries, vec!["requirements.txt"]);
            }
            other => panic!("expected MissingEntries, got {other:?}"),
        }
    }

    #[test]
    fn model_as_file_is_a_type_mismatch() {
        let dir = valid_project();
        fs::remove_dir_all(dir.path().join("model")).unwrap();
        fs::write(dir.path().join("model"), "not a dir").unwrap();
        let err = validate_project(dir.path()).unwrap_err();
        match err {
            ValidationError::MissingEntries(entries) => {
                assert_eq!(entries, vec!["model (not a directory)"]);
            }
            other => panic!("expected MissingEntries, got {other:?}"),
        }
    }

    #[test]
    fn empty_model_dir_only_warns() {
        let dir = valid_project();
        fs::remove_file(dir.path().join("model/weights.bin")).unwrap();
        assert!(validate_project(dir.path()).is_ok());
    }

    #[test]
    fn nested_model_dir_is_rejected() {
        let dir = valid_project();
        fs::remove_file(dir.path().join("model/weights.bin")).unwrap();
        fs::create_dir(dir.path().join("model/model")).unwrap();
        let err = validate_project(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NestedDirectory { ref dir } if dir == "model"
        ));
    }

    #[test]
    fn differently_named_single_child_passes() {
        let dir = valid_project();
        fs::remove_file(dir.path().join("model/weights.bin")).unwrap();
        fs::create_dir(dir.path().join("model/checkpoints")).unwrap();
        assert!(validate_project(dir.path()).is_ok());
    }

    #[test]
    fn two_children_including_same_name_pass() {
        let dir = valid_project();
        fs::create_dir(dir.path().join("model/model")).unwrap();
        // weights.bin is still there, so there are two entries
        assert!(validate_project(dir.path()).is_ok());
    }

    #[test]
    fn nested_examples_dir_is_rejected() {
        let dir = valid_project();
        fs::create_dir(dir.path().join("examples")).unwrap();
        fs::create_dir(dir.path().join("examples/examples")).unwrap();
        let err = validate_project(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NestedDirectory { ref dir } if dir == "examples"
        ));
    }

    #[test]
    fn examples_dir_is_detected() {
        let dir = valid_project();
        fs::create_dir(dir.path().join("examples")).unwrap();
        fs::write(dir.path().join("examples/sample.tif"), b"\x00").unwrap();
        let (_, has_examples) = validate_project(dir.path()).unwrap();
        assert!(has_examples);
    }

    #[test]
    fn examples_as_file_is_ignored() {
        let dir = valid_project();
        fs::write(dir.path().join("examples"), "not a dir").unwrap();
        let (_, has_examples) = validate_project(dir.path()).unwrap();
        assert!(!has_examples);
    }

    #[test]
    fn manifest_errors_pass_through() {
        let dir = valid_project();
        fs::write(dir.path().join("mc.json"), r#"{"model_info": {}}"#).unwrap();
        let err = validate_project(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Manifest(ManifestError::MissingModelName)
        ));
    }
}
