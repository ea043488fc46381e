use uuid::Uuid;

/// Repository prefix all images built by this tool are tagged under
pub const IMAGE_NAMESPACE: &str = "inoyb";

/// Derive an image tag from a model name.
///
/// The name is lowercased with spaces and underscores mapped to `-`, then an
/// 8-character random hex suffix is appended so repeated builds of the same
/// project never collide. Collision resistance is probabilistic only (~4
/// billion suffixes), which is plenty for build tooling.
pub fn generate_image_name(model_name: &str) -> String {
    let clean: String = model_name
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", clean, &suffix[..8])
}

/// Full repository tag for a generated name, e.g. `inoyb/flood-model-1a2b3c4d`
pub fn namespaced(image_name: &str) -> String {
    format!("{}/{}", IMAGE_NAMESPACE, image_name)
}

/// Infer the project a tag belongs to by stripping the namespace prefix and
/// the trailing random suffix segment. Tags without a suffix segment yield
/// `None` and are excluded from retention grouping.
pub fn project_key(tag: &str) -> Option<String> {
    let name = tag.strip_prefix(&format!("{}/", IMAGE_NAMESPACE))?;
    let (project, _suffix) = name.rsplit_once('-')?;
    if project.is_empty() {
        return None;
    }
    Some(project.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_prefix_is_sanitized() {
        let name = generate_image_name("My Model_X");
        assert!(name.starts_with("my-model-x-"));
    }

    #[test]
    fn suffix_is_eight_lowercase_hex_chars() {
        let name = generate_image_name("My Model_X");
        let suffix = name.strip_prefix("my-model-x-").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn consecutive_names_differ() {
        assert_ne!(generate_image_name("model"), generate_image_name("model"));
    }

    #[test]
    fn namespaced_tag_has_prefix() {
        assert_eq!(namespaced("flood-1a2b3c4d"), "inoyb/flood-1a2b3c4d");
    }

    #[test]
    fn project_key_strips_namespace_and_suffix() {
        assert_eq!(
            project_key("inoyb/flood-model-1a2b3c4d").as_deref(),
            Some("flood-model")
        );
    }

    #[test]
    fn project_key_ignores_foreign_tags() {
        assert_eq!(project_key("library/alpine-3a"), None);
        assert_eq!(project_key("inoyb/nosuffix"), None);
    }
}
