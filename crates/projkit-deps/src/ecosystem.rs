// Supported project ecosystems and the on-disk markers that identify them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported ecosystem: {0} (use: js, py, go, rs)")]
pub struct UnsupportedEcosystem(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    JavaScript, // npm, pnpm, bun
    Python,     // uv, pip, poetry
    Go,         // go modules
    Rust,       // cargo
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 4] = [
        Ecosystem::JavaScript,
        Ecosystem::Python,
        Ecosystem::Go,
        Ecosystem::Rust,
    ];

    /// Canonical identifier, also what gets persisted
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::JavaScript => "javascript",
            Ecosystem::Python => "python",
            Ecosystem::Go => "go",
            Ecosystem::Rust => "rust",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Ecosystem::JavaScript => "js",
            Ecosystem::Python => "py",
            Ecosystem::Go => "go",
            Ecosystem::Rust => "rs",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Ecosystem::JavaScript => "JavaScript/Node.js",
            Ecosystem::Python => "Python",
            Ecosystem::Go => "Go",
            Ecosystem::Rust => "Rust",
        }
    }

    /// Package managers that can drive a project of this ecosystem
    pub fn tools(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::JavaScript => &["pnpm", "npm", "bun"],
            Ecosystem::Python => &["uv", "pip", "poetry"],
            Ecosystem::Go => &["go"],
            Ecosystem::Rust => &["cargo"],
        }
    }

    pub fn default_tool(&self) -> &'static str {
        self.tools()[0]
    }

    pub fn supports_tool(&self, tool: &str) -> bool {
        self.tools().contains(&tool)
    }

    /// Files that declare dependencies, in the order they are preferred
    pub fn manifest_files(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::JavaScript => &["package.json"],
            Ecosystem::Python => &["pyproject.toml", "requirements.txt"],
            Ecosystem::Go => &["go.mod"],
            Ecosystem::Rust => &["Cargo.toml"],
        }
    }

    /// First manifest that exists under `dir`
    pub fn manifest_path(&self, dir: &Path) -> Option<PathBuf> {
        self.manifest_files()
            .iter()
            .map(|file| dir.join(file))
            .find(|path| path.exists())
    }

    fn markers(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::JavaScript => &["package.json"],
            Ecosystem::Python => &["pyproject.toml", "requirements.txt", "setup.py", "Pipfile"],
            Ecosystem::Go => &["go.mod"],
            Ecosystem::Rust => &["Cargo.toml"],
        }
    }

    /// Guess the ecosystem of an existing directory.
    ///
    /// Checked from most to least specific marker, since a Rust or Go project
    /// frequently carries a package.json for its frontend tooling.
    pub fn detect(dir: &Path) -> Option<Ecosystem> {
        [
            Ecosystem::Rust,
            Ecosystem::Go,
            Ecosystem::Python,
            Ecosystem::JavaScript,
        ]
        .into_iter()
        .find(|eco| eco.markers().iter().any(|m| dir.join(m).exists()))
    }

    /// Guess which tool manages the project, from lockfiles and config files
    pub fn detect_tool(&self, dir: &Path) -> &'static str {
        let has = |file: &str| dir.join(file).exists();

        match self {
            Ecosystem::JavaScript => {
                if has("pnpm-lock.yaml") {
                    "pnpm"
                } else if has("bun.lockb") || has("bun.lock") {
                    "bun"
                } else if has("package-lock.json") {
                    "npm"
                } else {
                    self.default_tool()
                }
            }
            Ecosystem::Python => {
                if has("uv.lock") {
                    "uv"
                } else if has("poetry.lock") {
                    "poetry"
                } else if has("Pipfile.lock") || (has("requirements.txt") && !has("pyproject.toml")) {
                    "pip"
                } else {
                    self.default_tool()
                }
            }
            Ecosystem::Go | Ecosystem::Rust => self.default_tool(),
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ecosystem {
    type Err = UnsupportedEcosystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" | "ts" | "typescript" | "node" => Ok(Ecosystem::JavaScript),
            "python" | "py" => Ok(Ecosystem::Python),
            "go" | "golang" => Ok(Ecosystem::Go),
            "rust" | "rs" => Ok(Ecosystem::Rust),
            _ => Err(UnsupportedEcosystem(s.to_string())),
        }
    }
}
