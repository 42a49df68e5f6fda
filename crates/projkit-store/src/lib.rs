// SQLite-backed project registry
// Tracked projects plus the last-synced snapshot of their declared dependencies

pub mod dependencies;
pub mod error;
pub mod models;
pub mod store;

pub use error::{Result, StoreError};
pub use models::{is_project_id, new_project_id, Project, StoredDependency};
pub use store::Store;
