use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("A project is already tracked at {0}")]
    DuplicatePath(String),

    #[error("Invalid project: {0}")]
    InvalidProject(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
