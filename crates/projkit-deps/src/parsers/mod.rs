// Manifest parsers, one per ecosystem
//
// Every parser follows the same policy: a missing manifest is an empty set,
// a manifest that can't be read or decoded is an error, and a single bad
// entry is skipped without losing the rest of the file.

pub mod golang;
pub mod javascript;
pub mod python;
pub mod rust;

pub use golang::{parse_go_mod, GoModParser};
pub use javascript::{parse_package_json, PackageJsonParser};
pub use python::{parse_pyproject_toml, parse_requirement, parse_requirements_txt, PythonParser};
pub use rust::{parse_cargo_toml, CargoTomlParser};

use crate::ecosystem::Ecosystem;
use crate::error::{ManifestError, Result};
use crate::models::DependencySet;
use std::path::Path;

/// Reads an ecosystem's manifest(s) under a project root
pub trait ManifestParser: Send + Sync {
    fn ecosystem(&self) -> Ecosystem;

    fn parse(&self, project_root: &Path) -> Result<DependencySet>;
}

/// Parser matching the given ecosystem
pub fn parser_for(ecosystem: Ecosystem) -> &'static dyn ManifestParser {
    match ecosystem {
        Ecosystem::JavaScript => &PackageJsonParser,
        Ecosystem::Python => &PythonParser,
        Ecosystem::Go => &GoModParser,
        Ecosystem::Rust => &CargoTomlParser,
    }
}

/// Parse the declared dependencies of the project at `project_root`
pub fn parse_project(ecosystem: Ecosystem, project_root: &Path) -> Result<DependencySet> {
    parser_for(ecosystem).parse(project_root)
}

/// Read a manifest, mapping "not found" to `None`
pub(crate) fn read_manifest(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ManifestError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub(crate) fn decode_error(path: &Path, reason: impl ToString) -> ManifestError {
    ManifestError::Decode {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_manifest_is_empty_for_every_ecosystem() {
        let temp_dir = TempDir::new().unwrap();

        for eco in Ecosystem::ALL {
            let deps = parse_project(eco, temp_dir.path()).unwrap();
            assert!(deps.is_empty(), "{} should parse to nothing", eco);
        }
    }

    #[test]
    fn test_parser_for_matches_ecosystem() {
        for eco in Ecosystem::ALL {
            assert_eq!(parser_for(eco).ecosystem(), eco);
        }
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(
            dir.join("package.json"),
            r#"{"dependencies":{"react":"^18.0.0"},"devDependencies":{"vite":"^5.0.0"}}"#,
        )
        .unwrap();
        fs::write(dir.join("requirements.txt"), "requests==2.31.0\nflask>=2.0\n").unwrap();
        fs::write(
            dir.join("go.mod"),
            "module example.com/app\n\nrequire (\n\tgithub.com/spf13/cobra v1.8.0\n)\n",
        )
        .unwrap();
        fs::write(dir.join("Cargo.toml"), "[dependencies]\nserde = \"1.0\"\n").unwrap();

        for eco in Ecosystem::ALL {
            let first = parse_project(eco, dir).unwrap();
            let second = parse_project(eco, dir).unwrap();
            assert!(!first.is_empty());
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_unreadable_manifest_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the file should be can't be read as text
        fs::create_dir(temp_dir.path().join("go.mod")).unwrap();

        let err = parse_project(Ecosystem::Go, temp_dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
        assert_eq!(err.path(), temp_dir.path().join("go.mod"));
    }
}
