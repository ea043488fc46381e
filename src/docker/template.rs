use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

/// Bundled Dockerfile templates, compiled into the binary
const CPU_TEMPLATE: &str = include_str!("../../templates/dockerfile.template");
const GPU_TEMPLATE: &str = include_str!("../../templates/dockerfile-gpu.template");

/// Directory inside a project that can override the bundled templates
const PROJECT_TEMPLATE_DIR: &str = ".inoyb";

/// Base image used when the local Python version cannot be determined or is
/// not in the lookup table
const FALLBACK_BASE_IMAGE: &str = "python:3.11-slim";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("cannot read Dockerfile template {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Dockerfile template references unknown placeholder {{{name}}}")]
    UnknownPlaceholder { name: String },
}

/// Where a template came from, for rendering and log messages
enum TemplateSource {
    Project(PathBuf),
    Builtin(&'static str),
}

/// Pick the template for this build: a project-local override under
/// `.inoyb/` wins, otherwise the bundled CPU or GPU template is used.
fn resolve_template(project_path: &Path, use_gpu: bool) -> TemplateSource {
    let file_name = if use_gpu {
        "dockerfile-gpu.template"
    } else {
        "dockerfile.template"
    };

    let project_template = project_path.join(PROJECT_TEMPLATE_DIR).join(file_name);
    if project_template.is_file() {
        info!("Using project template {}", project_template.display());
        return TemplateSource::Project(project_template);
    }

    let builtin = if use_gpu { GPU_TEMPLATE } else { CPU_TEMPLATE };
    debug!("Using built-in template {}", file_name);
    TemplateSource::Builtin(builtin)
}

/// Map the Python version available on this machine to a base image tag.
///
/// The probe shells out to `python3 --version`; any failure, or a version
/// outside the known table, falls back to the newest known image.
fn resolve_base_image() -> String {
    let known = [
        ((3, 8), "python:3.8-slim"),
        ((3, 9), "python:3.9-slim"),
        ((3, 10), "python:3.10-slim"),
        ((3, 11), "python:3.11-slim"),
        ((3, 12), "python:3.12-slim"),
    ];

    let Some(version) = probe_python_version() else {
        debug!("Could not determine local Python version, using fallback base image");
        return FALLBACK_BASE_IMAGE.to_string();
    };

    known
        .iter()
        .find(|(v, _)| *v == version)
        .map(|(_, image)| image.to_string())
        .unwrap_or_else(|| FALLBACK_BASE_IMAGE.to_string())
}

/// `python3 --version` → (major, minor), or None if the probe fails
fn probe_python_version() -> Option<(u32, u32)> {
    let output = Command::new("python3").arg("--version").output().ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    parse_python_version(text.trim())
}

fn parse_python_version(text: &str) -> Option<(u32, u32)> {
    let version = text.strip_prefix("Python ")?;
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

/// Render the Dockerfile for a project.
///
/// Substitutes `{base_image}` and `{examples_copy}` into the resolved
/// template. A placeholder left over after substitution means the template
/// (usually a project override) references a variable this tool does not
/// provide, which is reported rather than shipped to the engine.
pub fn render_dockerfile(
    project_path: &Path,
    has_examples: bool,
    use_gpu: bool,
) -> Result<String, TemplateError> {
    let template = match resolve_template(project_path, use_gpu) {
        TemplateSource::Project(path) => {
            std::fs::read_to_string(&path).map_err(|source| TemplateError::Unreadable {
                path,
                source,
            })?
        }
        TemplateSource::Builtin(contents) => contents.to_string(),
    };

    let base_image = resolve_base_image();
    let examples_copy = if has_examples {
        "COPY examples/ ./examples/"
    } else {
        ""
    };

    let rendered = template
        .replace("{base_image}", &base_image)
        .replace("{examples_copy}", examples_copy);

    if let Some(captures) = PLACEHOLDER.captures(&rendered) {
        return Err(TemplateError::UnknownPlaceholder {
            name: captures[1].to_string(),
        });
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn builtin_template_renders_without_placeholders() {
        let dir = tempdir().unwrap();
        let rendered = render_dockerfile(dir.path(), true, false).unwrap();
        assert!(rendered.contains("FROM python:"));
        assert!(rendered.contains("COPY examples/ ./examples/"));
        assert!(!PLACEHOLDER.is_match(&rendered));
    }

    #[test]
    fn examples_copy_is_omitted_without_examples() {
        let dir = tempdir().unwrap();
        let rendered = render_dockerfile(dir.path(), false, false).unwrap();
        assert!(!rendered.contains("COPY examples/"));
    }

    #[test]
    fn gpu_template_differs_from_cpu() {
        let dir = tempdir().unwrap();
        let cpu = render_dockerfile(dir.path(), false, false).unwrap();
        let gpu = render_dockerfile(dir.path(), false, true).unwrap();
        assert_ne!(cpu, gpu);
    }

    #[test]
    fn project_override_wins() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".inoyb")).unwrap();
        fs::write(
            dir.path().join(".inoyb/dockerfile.template"),
            "FROM {base_image}\n# custom\n{examples_copy}\n",
        )
        .unwrap();

        let rendered = render_dockerfile(dir.path(), false, false).unwrap();
        assert!(rendered.contains("# custom"));
    }

    #[test]
    fn unknown_placeholder_is_reported() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".inoyb")).unwrap();
        fs::write(
            dir.path().join(".inoyb/dockerfile.template"),
            "FROM {base_image}\nRUN echo {mystery}\n",
        )
        .unwrap();

        let err = render_dockerfile(dir.path(), false, false).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::UnknownPlaceholder { ref name } if name == "mystery"
        ));
    }

    #[test]
    fn python_version_parsing() {
        assert_eq!(parse_python_version("Python 3.11.4"), Some((3, 11)));
        assert_eq!(parse_python_version("Python 3.8"), Some((3, 8)));
        assert_eq!(parse_python_version("not python"), None);
    }
}
