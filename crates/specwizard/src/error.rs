//! Error types for specwizard.
//!
//! This module defines all error types used throughout the specwizard crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for specwizard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create a database.
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

    /// The product dataset does not have the expected tables or columns.
    #[error("dataset schema mismatch: {message}")]
    DatasetSchema {
        /// Description of the missing table or column.
        message: String,
    },

    // === Dataset Lifecycle Errors ===
    /// The dataset file could not be found, even after re-attempting.
    #[error("dataset not available at {path}")]
    DatasetUnavailable {
        /// Path that was checked.
        path: PathBuf,
    },

    /// An operation needed the dataset before it finished loading.
    #[error("dataset is not loaded yet")]
    DatasetNotReady,

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

    // === Input Errors ===
    /// A filter criterion could not be parsed.
    #[error("invalid criterion '{input}': expected GROUP/KEY=VALUE")]
    InvalidCriterion {
        /// The text that failed to parse.
        input: String,
    },

    // === Hunt Errors ===
    /// A hunt was started without any steps.
    #[error("the treasure hunt has no steps")]
    HuntEmpty,

    /// A hunt step lookup failed.
    #[error("no hunt step with code '{code}'")]
    StepNotFound {
        /// The QR code that was looked up.
        code: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

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
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for specwizard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a dataset schema error.
    #[must_use]
    pub fn dataset_schema(message: impl Into<String>) -> Self {
        Self::DatasetSchema {
            message: message.into(),
        }
    }

    /// Create an invalid criterion error.
    #[must_use]
    pub fn invalid_criterion(input: impl Into<String>) -> Self {
        Self::InvalidCriterion {
            input: input.into(),
        }
    }

    /// Check if this error means the dataset has not been loaded yet.
    #[must_use]
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::DatasetNotReady)
    }

    /// Check if retrying the dataset load could succeed.
    ///
    /// Missing files and I/O failures are retryable; a schema mismatch is not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DatasetUnavailable { .. } | Self::Io(_) | Self::DatabaseOpen { .. }
        )
    }
}
