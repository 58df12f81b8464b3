//! Single static file middleware
//!
//! A middleware that answers every request routed to it with one fixed file,
//! optionally a pre-compressed variant chosen by `Accept-Encoding`, plus the
//! small HTTP server that hosts chains of them.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod middleware;
pub mod server;

pub use error::{Error, Result, SendError};
pub use middleware::{Middleware, StaticFile, StaticFileOptions};
