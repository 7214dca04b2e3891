//! # quorum-core
//!
#![warn(
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]
#![deny(rustdoc::broken_intra_doc_links)]
pub use anyhow;
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;

pub use crate::router::HookRouter;

pub mod handler;
pub mod hook;
pub mod prelude;
pub mod router;

/// Register a relation handler with the router
pub trait Register {
    /// add the handler to the router's dispatch list in the implementation of
    /// this method
    fn register(self, router: &mut HookRouter);
}
