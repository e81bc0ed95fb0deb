use crate::config::JarloomConfig;
use crate::errors::MemberKind;
use crate::hierarchy::ClasspathIndex;
use crate::mapping::MappingTree;
use anyhow::{bail, Context, Result};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub kind: MemberKind,
    pub owner: Option<String>,
    pub name: String,
    pub descriptor: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Resolve one member name. The configured libraries supply the hierarchy.
pub fn resolve_member(config: &JarloomConfig, request: &ResolveRequest) -> Result<String> {
    let mappings = config.mappings()?;
    let tree = MappingTree::load(mappings)
        .with_context(|| format!("Failed to load mappings {}", mappings.display()))?;

    let from = request.from.as_deref().unwrap_or(&config.remap.from);
    let to = request.to.as_deref().unwrap_or(&config.remap.to);
    let hierarchy = ClasspathIndex::from_jars(&config.inputs.libraries)?;
    let remapper = tree
        .remapper(from, to, Arc::new(hierarchy))?
        .with_skip_prefixes(config.remap.skip_prefixes.iter());

    let owner = request.owner.as_deref();
    let resolved = match request.kind {
        MemberKind::Method => {
            remapper.resolve_method_name(owner, &request.name, request.descriptor.as_deref())?
        }
        MemberKind::Field => {
            let Some(descriptor) = request.descriptor.as_deref() else {
                bail!("fields resolve on name and descriptor; pass --desc");
            };
            remapper.resolve_field_name(owner, &request.name, descriptor)?
        }
    };

    println!("{}", resolved);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> JarloomConfig {
        let mappings = dir.path().join("mappings.tiny");
        fs::write(
            &mappings,
            indoc! {"
                tiny\t2\t0\tintermediate\tnamed
                c\tclass_1\tpkg/Alpha
                \tf\tI\tfield_1\tcount
                \tm\t()V\tmethod_1\trun
                c\tclass_2\tpkg/Beta
                \tm\t()V\tmethod_1\tstop
            "},
        )
        .unwrap();
        let mut config = JarloomConfig::default();
        config.inputs.mappings = Some(mappings);
        config
    }

    fn request(kind: MemberKind, owner: Option<&str>, name: &str, desc: Option<&str>) -> ResolveRequest {
        ResolveRequest {
            kind,
            owner: owner.map(str::to_string),
            name: name.to_string(),
            descriptor: desc.map(str::to_string),
            from: None,
            to: None,
        }
    }

    #[test]
    fn test_resolves_with_owner() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let method = request(MemberKind::Method, Some("class_2"), "method_1", Some("()V"));
        assert_eq!(resolve_member(&config, &method).unwrap(), "stop");
        let field = request(MemberKind::Field, None, "field_1", Some("I"));
        assert_eq!(resolve_member(&config, &field).unwrap(), "count");
    }

    #[test]
    fn test_ambiguous_without_owner_fails() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let method = request(MemberKind::Method, None, "method_1", Some("()V"));
        assert!(resolve_member(&config, &method).is_err());
    }

    #[test]
    fn test_field_requires_descriptor() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let field = request(MemberKind::Field, None, "field_1", None);
        assert!(resolve_member(&config, &field).is_err());
    }
}
