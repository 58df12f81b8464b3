//! Middleware module
//!
//! A middleware looks at a request and either answers it, declines so the
//! next middleware in the chain gets a chance, or fails.

mod static_file;

pub use static_file::{StaticFile, StaticFileOptions};

use crate::error::Result;
use crate::http::Body;
use async_trait::async_trait;
use hyper::{Request, Response};

/// One link of a chain-of-responsibility
///
/// * `Ok(Some(response))` - the request is answered
/// * `Ok(None)` - declined, the next middleware is tried
/// * `Err(error)` - fatal, the host's error path takes over
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: &Request<()>) -> Result<Option<Response<Body>>>;

    /// Name used in logs
    fn name(&self) -> &'static str {
        "middleware"
    }
}
