//! sortbox - a file sorting drop box.
//!
//! Uploaded files are classified by content type into fixed categories,
//! stored on disk one directory per category, and served back through a
//! small HTTP API with listing, search, analytics, preview, zip download and
//! clearing.

pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use error::{Result, SortboxError};
pub use file::{Category, FileStorage};
