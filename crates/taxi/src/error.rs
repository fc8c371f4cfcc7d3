//! Error types for taxi.
//!
//! Every operation in the crate reports failure through [`Error`]. None of
//! these are fatal: handlers return them as values and the caller decides how
//! to surface them.

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::FieldErrors;

/// The main error type for taxi operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Access Errors ===
    /// No authenticated principal was supplied.
    #[error("authentication required")]
    Unauthenticated,

    /// Username or password did not match a driver.
    #[error("invalid username or password")]
    InvalidCredentials,

    // === Record Errors ===
    /// The requested record does not exist.
    #[error("{kind} with id {id} not found")]
    NotFound {
        /// Entity kind, e.g. `"car"`.
        kind: &'static str,
        /// The id that failed to resolve.
        id: i64,
    },

    /// Submitted fields failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The record is still referenced and cannot be deleted.
    #[error("{kind} with id {id} is referenced by {dependents} record(s)")]
    Protected {
        /// Entity kind, e.g. `"manufacturer"`.
        kind: &'static str,
        /// The id of the protected record.
        id: i64,
        /// How many records still reference it.
        dependents: i64,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Auth Errors ===
    /// Hashing or parsing a password hash failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// Converting a value to JSON failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for taxi operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<FieldErrors> for Error {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl Error {
    /// Create a not-found error for the given entity kind.
    #[must_use]
    pub fn not_found(kind: &'static str, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error means no principal was supplied.
    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// The per-field messages, if this is a validation error.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
