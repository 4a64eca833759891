use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid full-text search expression: {0}")]
    FtsSyntax(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("No display rule for type: {0}")]
    MissingRule(String),

    #[error("Template rendering failed: {0}")]
    Template(String),
}

pub type Result<T> = std::result::Result<T, Error>;
