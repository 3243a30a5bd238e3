//! Web API for sortbox.
//!
//! Exposes upload, listing, search, analytics, preview, zip download and
//! clearing over HTTP, plus read-only access to stored files under
//! `/uploads`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_app, create_router};
pub use server::WebServer;
