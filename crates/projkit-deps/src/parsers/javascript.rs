use super::{decode_error, read_manifest, ManifestParser};
use crate::ecosystem::Ecosystem;
use crate::error::Result;
use crate::models::{Dependency, DependencyKind, DependencySet};
use std::path::Path;
use tracing::debug;

pub struct PackageJsonParser;

impl ManifestParser for PackageJsonParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::JavaScript
    }

    fn parse(&self, project_root: &Path) -> Result<DependencySet> {
        let path = project_root.join("package.json");
        match read_manifest(&path)? {
            Some(content) => parse_package_json(&content).map_err(|e| decode_error(&path, e)),
            None => Ok(DependencySet::new()),
        }
    }
}

/// Parse package.json for Node.js dependencies
///
/// `devDependencies` are applied after `dependencies`, so a package listed in
/// both ends up classified as a dev dependency.
pub fn parse_package_json(content: &str) -> serde_json::Result<DependencySet> {
    let package: serde_json::Value = serde_json::from_str(content)?;
    let mut dependencies = DependencySet::new();

    for (section, kind) in [
        ("dependencies", DependencyKind::Production),
        ("devDependencies", DependencyKind::Development),
    ] {
        let Some(deps) = package.get(section).and_then(|v| v.as_object()) else {
            continue;
        };

        for (name, value) in deps {
            match value.as_str() {
                Some(version) => {
                    dependencies.insert(name.clone(), Dependency::new(name.clone(), version, kind));
                }
                None => debug!("Skipping {} entry {} with non-string version", section, name),
            }
        }
    }

    Ok(dependencies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_package_json() {
        let content = r#"{"dependencies":{"react":"^18.0.0"},"devDependencies":{"typescript":"^5.0.0"}}"#;

        let deps = parse_package_json(content).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps["react"], Dependency::production("react", "^18.0.0"));
        assert_eq!(deps["typescript"], Dependency::development("typescript", "^5.0.0"));
    }

    #[test]
    fn test_dev_entry_wins_on_collision() {
        let content = r#"
{
  "dependencies": { "lodash": "^4.17.0" },
  "devDependencies": { "lodash": "^4.17.21" }
}
        "#;

        let deps = parse_package_json(content).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps["lodash"].version, "^4.17.21");
        assert!(deps["lodash"].is_dev());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let content = r#"
{
  "name": "web",
  "dependencies": {
    "react": "^18.0.0",
    "express": "4.18.0",
    "broken": 42,
    "also-broken": { "version": "1.0.0" }
  },
  "devDependencies": {
    "typescript": "^5.0.0",
    "nope": null
  }
}
        "#;

        let deps = parse_package_json(content).unwrap();
        assert_eq!(deps.len(), 3);
        assert!(!deps.contains_key("broken"));
        assert!(!deps.contains_key("nope"));
    }

    #[test]
    fn test_no_dependency_tables() {
        let deps = parse_package_json(r#"{"name":"empty","version":"1.0.0"}"#).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_invalid_json_file_is_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), "{ not json").unwrap();

        let err = PackageJsonParser.parse(temp_dir.path()).unwrap_err();
        assert!(matches!(err, crate::ManifestError::Decode { .. }));
    }
}
