//! Error types for the pocketnotes application.
//!
//! This module defines the error categories that can surface from the storage
//! adapters, the background writer and the command-line front-end. The notes
//! repository itself absorbs and logs failures instead of returning them.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the pocketnotes application.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A key-value store operation failed.
    #[error("Storage error for key {key}: {message}")]
    Storage { key: String, message: String },

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// for mutex lock acquisition issues
    #[error("{message}")]
    LockAcquisitionFailed { message: String },

    /// The background persistence writer is no longer accepting commands.
    #[error("Persistence writer has stopped")]
    WriterStopped,

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
