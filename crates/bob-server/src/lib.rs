//! HTTP server for Bob.
//!
//! Accepts static-site bundles as immutable, content-addressed artifacts,
//! binds `.bob` aliases to them, and serves their files under
//! `/{alias}/…` with an HTML base rewrite.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod router;
pub mod serve;
pub mod server;
pub mod state;

pub use auth::{AuthProvider, Credentials, Identity, TokenTableAuth, TrustedBearerAuth};
pub use config::{BlobBackend, LogFormat, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::BobServer;
pub use state::AppState;
