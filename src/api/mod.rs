//! Remote content service access.
//!
//! The lifecycle manager consumes content through the `ContentSource`
//! trait; `ContentClient` is the reqwest-backed production implementation.

mod client;
mod error;

pub use client::{ContentClient, ContentSource};
pub use error::ApiError;
