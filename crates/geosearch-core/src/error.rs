use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid mapping: {0}")]
    Mapping(String),

    #[error("Invalid geo point: {0}")]
    GeoPoint(String),

    #[error("Invalid distance: {0}")]
    Distance(String),

    #[error("Invalid query: {0}")]
    Query(String),

    #[error("Index operation failed: {0}")]
    Index(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
