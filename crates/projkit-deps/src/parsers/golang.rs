use super::{read_manifest, ManifestParser};
use crate::ecosystem::Ecosystem;
use crate::error::Result;
use crate::models::{Dependency, DependencySet};
use std::path::Path;
use tracing::debug;

pub struct GoModParser;

impl ManifestParser for GoModParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn parse(&self, project_root: &Path) -> Result<DependencySet> {
        Ok(read_manifest(&project_root.join("go.mod"))?
            .map(|content| parse_go_mod(&content))
            .unwrap_or_default())
    }
}

/// Parse go.mod `require` directives
///
/// Both the block form and the single-line form are read. `// indirect`
/// marks a transitive pin, not a build-only one, so every module is
/// production.
pub fn parse_go_mod(content: &str) -> DependencySet {
    let mut dependencies = DependencySet::new();
    let mut in_require = false;

    for line in content.lines() {
        let trimmed = strip_comment(line).trim();

        if in_require {
            if trimmed == ")" {
                in_require = false;
            } else if !trimmed.is_empty() {
                insert_module(&mut dependencies, trimmed.split_whitespace().collect());
            }
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("require") {
            let rest = rest.trim();
            if rest == "(" {
                in_require = true;
            } else if trimmed.starts_with("require ") {
                insert_module(&mut dependencies, rest.split_whitespace().collect());
            }
        }
    }

    dependencies
}

fn insert_module(deps: &mut DependencySet, parts: Vec<&str>) {
    match parts.as_slice() {
        [path, version] => {
            deps.insert(path.to_string(), Dependency::production(*path, *version));
        }
        _ => debug!("Skipping malformed require entry: {}", parts.join(" ")),
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_require_block() {
        let content = r#"
module github.com/acme/service

go 1.22

require (
	github.com/spf13/cobra v1.8.0
	golang.org/x/sync v0.7.0 // indirect
)
        "#;

        let deps = parse_go_mod(content);
        assert_eq!(deps.len(), 2);
        assert_eq!(
            deps["github.com/spf13/cobra"],
            Dependency::production("github.com/spf13/cobra", "v1.8.0")
        );
        assert_eq!(deps["golang.org/x/sync"].version, "v0.7.0");
    }

    #[test]
    fn test_parse_single_line_require() {
        let content = "module x\n\nrequire github.com/google/uuid v1.6.0\n";

        let deps = parse_go_mod(content);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps["github.com/google/uuid"].version, "v1.6.0");
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let content = r#"
module x

require (
	github.com/a/one v1.0.0
	github.com/broken
	// github.com/commented/out v0.1.0
	github.com/b/two v2.0.0 extra-field
	github.com/c/three v3.0.0
)

require github.com/lonely
require github.com/d/four v4.0.0
replace github.com/a/one => ../one
        "#;

        let deps = parse_go_mod(content);
        let names: Vec<_> = deps.keys().cloned().collect();
        assert_eq!(
            names,
            vec!["github.com/a/one", "github.com/c/three", "github.com/d/four"]
        );
    }

    #[test]
    fn test_other_blocks_are_ignored() {
        let content = r#"
module x

replace (
	github.com/a/one v1.0.0 => ../one
)

exclude github.com/bad/mod v0.0.1
        "#;

        assert!(parse_go_mod(content).is_empty());
    }
}
