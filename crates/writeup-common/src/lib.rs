//! Shared plumbing for the writeup crates: errors, configuration, the object
//! storage contract and tracing setup.

pub mod config;
pub mod error;
pub mod storage;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use crate::config::Config;
pub use crate::error::{ConfigError, SerDeError, StorageError};
pub use crate::storage::{MemoryStorage, ObjectStorage, UploadResult};
