//! Client library for the opsync server.
//!
//! Provides an HTTP client for the sync, status and task query endpoints.

pub mod error;
pub mod http;

pub use error::ClientError;
pub use http::{HttpClient, TaskQuery};
