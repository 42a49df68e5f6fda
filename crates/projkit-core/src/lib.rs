// Ties the pieces together: tracked projects in the store, manifests parsed
// into dependency snapshots, package managers driven through the registry

pub mod config;
pub mod error;
pub mod tracker;

pub use config::{Config, ToolDefaults};
pub use error::Error;
pub use tracker::Tracker;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
