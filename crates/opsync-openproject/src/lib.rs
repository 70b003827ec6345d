//! OpenProject connector for opsync.
//!
//! Fetches work packages from the OpenProject v3 API and maps them into
//! [`opsync_core::CanonicalTask`] values.

pub mod client;
pub mod config;
pub mod error;
pub mod mapping;
pub mod wire;

pub use client::{OpenProjectClient, SyncConfiguration};
pub use config::OpenProjectConfig;
pub use error::{MappingError, UpstreamError};
pub use mapping::map_work_package;
