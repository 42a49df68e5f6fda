// Declared-dependency model and manifest parsers
// One parser per ecosystem, all producing the same name-keyed DependencySet

pub mod ecosystem;
pub mod error;
pub mod models;
pub mod parsers;

pub use ecosystem::{Ecosystem, UnsupportedEcosystem};
pub use error::{ManifestError, Result};
pub use models::{Dependency, DependencyKind, DependencySet, DependencySummary};
pub use parsers::{parse_project, parser_for, ManifestParser};
