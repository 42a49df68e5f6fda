use projkit_deps::Ecosystem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Lives at `<config dir>/projkit/config.toml`. Every field has a default,
/// so a missing file or a file with only some keys both work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where new projects get created
    #[serde(default = "default_projects_root")]
    pub projects_root: PathBuf,

    /// Editor command for opening projects (falls back to $EDITOR)
    #[serde(default)]
    pub editor: Option<String>,

    /// Package manager picked for new projects of each ecosystem
    #[serde(default)]
    pub tools: ToolDefaults,

    /// Override for the SQLite database location
    #[serde(default)]
    pub database: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects_root: default_projects_root(),
            editor: None,
            tools: ToolDefaults::default(),
            database: None,
        }
    }
}

impl Config {
    /// Load config from the default location, or defaults if there's no file yet
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Save config to the default location
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            // No config file? Use defaults
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.tools.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the config file path
    /// Uses XDG on Linux, Application Support on macOS, AppData on Windows
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?;
        Ok(config_dir.join("projkit").join("config.toml"))
    }

    /// The configured database path, or the platform data directory
    pub fn database_path(&self) -> crate::Result<PathBuf> {
        if let Some(ref path) = self.database {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?;
        Ok(data_dir.join("projkit").join("projkit.db"))
    }

    /// Editor to open projects with: config first, then $VISUAL / $EDITOR
    pub fn editor_command(&self) -> Option<String> {
        self.editor
            .clone()
            .or_else(|| std::env::var("VISUAL").ok())
            .or_else(|| std::env::var("EDITOR").ok())
            .filter(|editor| !editor.trim().is_empty())
    }
}

fn default_projects_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("projects")
}

/// Default package manager per ecosystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefaults {
    #[serde(default = "default_javascript")]
    pub javascript: String,

    #[serde(default = "default_python")]
    pub python: String,

    #[serde(default = "default_go")]
    pub go: String,

    #[serde(default = "default_rust")]
    pub rust: String,
}

fn default_javascript() -> String {
    Ecosystem::JavaScript.default_tool().to_string()
}

fn default_python() -> String {
    Ecosystem::Python.default_tool().to_string()
}

fn default_go() -> String {
    Ecosystem::Go.default_tool().to_string()
}

fn default_rust() -> String {
    Ecosystem::Rust.default_tool().to_string()
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            javascript: default_javascript(),
            python: default_python(),
            go: default_go(),
            rust: default_rust(),
        }
    }
}

impl ToolDefaults {
    pub fn for_ecosystem(&self, ecosystem: Ecosystem) -> &str {
        match ecosystem {
            Ecosystem::JavaScript => &self.javascript,
            Ecosystem::Python => &self.python,
            Ecosystem::Go => &self.go,
            Ecosystem::Rust => &self.rust,
        }
    }

    /// Reject a default that doesn't belong to its ecosystem, like `python = "npm"`
    pub fn validate(&self) -> crate::Result<()> {
        for ecosystem in Ecosystem::ALL {
            let tool = self.for_ecosystem(ecosystem);
            if !ecosystem.supports_tool(tool) {
                return Err(crate::Error::ConfigError(format!(
                    "'{}' is not a {} package manager (use one of: {})",
                    tool,
                    ecosystem.display_name(),
                    ecosystem.tools().join(", ")
                )));
            }
        }
        Ok(())
    }
}
