//! Command-line front-end driving a file-backed notes repository.
mod app;
mod args;

pub use app::*;
pub use args::*;
