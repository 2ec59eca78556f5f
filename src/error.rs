//! Error types for vido
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad config, unknown list)
//! - 4: Operation failed (I/O, cache write, adapter failure)
//! - 20: No todo with the requested id
//! - 21: Todo is read-only (multiple VTODOs share one file)
//! - 22: No list directories matched the configured pattern
//! - 23: Two objects share the same identity

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the vido CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
    pub const NO_SUCH_TODO: i32 = 20;
    pub const READ_ONLY_TODO: i32 = 21;
    pub const NO_LISTS_FOUND: i32 = 22;
    pub const ALREADY_EXISTS: i32 = 23;
}

/// Main error type for vido operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No list named {name}. Available lists are: {available}")]
    ListNotFound { name: String, available: String },

    // Specific failures with their own exit codes
    #[error("No todo with id {0}.")]
    NoSuchTodo(i64),

    #[error("Todo is read-only because there are multiple todos in {0}")]
    ReadOnlyTodo(PathBuf),

    #[error("No lists found matching {0}, create a directory for a new list.")]
    NoListsFound(String),

    #[error("More than one {kind} has the same identity: {name}.")]
    AlreadyExists { kind: &'static str, name: String },

    // Operation failures (exit code 4)
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::ListNotFound { .. }
            | Error::TomlParse(_) => exit_codes::USER_ERROR,

            Error::NoSuchTodo(_) => exit_codes::NO_SUCH_TODO,
            Error::ReadOnlyTodo(_) => exit_codes::READ_ONLY_TODO,
            Error::NoListsFound(_) => exit_codes::NO_LISTS_FOUND,
            Error::AlreadyExists { .. } => exit_codes::ALREADY_EXISTS,

            Error::Parse { .. }
            | Error::Cache(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for vido operations
pub type Result<T> = std::result::Result<T, Error>;
