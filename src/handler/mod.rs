//! Request handler module
//!
//! Hosts the middleware chains: path dispatch, the final 404 and the error path.

pub mod router;

// Re-export main entry point
pub use router::{handle_request, Router};
