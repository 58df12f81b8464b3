//! HTTP protocol layer module
//!
//! Content negotiation, MIME lookup, cache validators, ranges and the file
//! streaming primitive the middleware is built on.

pub mod cache;
pub mod encoding;
pub mod mime;
pub mod range;
pub mod response;
pub mod send;

// Re-export commonly used types
pub use encoding::AcceptEncoding;
pub use response::{build_404_response, build_error_response, Body};
pub use send::{send, Dotfiles, SendHooks, SendOptions};
