//! Personal notes library
//!
//! This library holds the state and data layer of a note-taking app: the note
//! collection with its derived tag index, filtering, sorting and search,
//! selection-driven bulk operations, settings, and best-effort persistence to
//! a key-value store.

mod cli;
mod config;
mod editor;
mod errors;
mod helper;
mod note;
mod persistence;
mod repository;
mod storage;
mod types;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use editor::*;
pub use errors::*;
pub use helper::*;
pub use note::*;
pub use persistence::*;
pub use repository::*;
pub use storage::*;
pub use types::*;
