//! Common error types for ComPath

use thiserror::Error;

/// Common result type for ComPath operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the ComPath crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote curation file could not be fetched
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Resource catalog or request body could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource name is not registered in the resource registry
    #[error("Manager does not exist for {0}")]
    UnknownResource(String),

    /// Pathway does not exist in the resource it was claimed to belong to
    #[error("'{pathway}' not found in '{resource}'")]
    PathwayNotFound { resource: String, pathway: String },

    /// Mapping type outside `equivalentTo` / `isPartOf`
    #[error("Invalid mapping type '{0}'. Mapping type should be equivalentTo or isPartOf")]
    InvalidMappingType(String),

    /// Vote signal outside up (1) / down (0)
    #[error("Invalid vote type {0}. Vote type should be 0 or 1")]
    InvalidVoteType(String),

    /// Configured curator email has no user account
    #[error(
        "There is no user with the email \"{0}\". Please create it with the \"make-user\" command"
    )]
    CurationIdentityMissing(String),

    /// Two writers raced on the same canonical mapping; the loser re-reads it
    #[error("Mapping already exists (concurrent insert)")]
    DuplicateMappingRace,

    /// Requested entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or malformed curation row
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error rejects a single curation row rather than the whole run
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            Error::PathwayNotFound { .. }
                | Error::InvalidMappingType(_)
                | Error::InvalidInput(_)
                | Error::UnknownResource(_)
        )
    }
}
