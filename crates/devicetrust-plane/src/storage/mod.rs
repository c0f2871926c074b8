//! Storage abstraction for registered devices
//!
//! The registrar and verifier only see the `DeviceStore` trait. The store is
//! built once at startup and injected; there is no process-global map.
//! `MemoryStore` is the only backend and loses its contents on restart.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use devicetrust_core::DeviceRecord;
use std::fmt::Debug;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Device already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage lock poisoned: {0}")]
    Poisoned(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Storage backend trait for device records
///
/// Implementations must be thread-safe. A reader never observes a
/// partially written record: writes replace whole records.
#[async_trait]
pub trait DeviceStore: Send + Sync + Debug {
    /// Insert or replace a record, returning the one it replaced
    async fn put_device(&self, record: DeviceRecord) -> Result<Option<DeviceRecord>, StorageError>;

    /// Insert a record only if the id is free
    ///
    /// Fails with `AlreadyExists` when a record with the same id is present.
    async fn insert_device(&self, record: DeviceRecord) -> Result<(), StorageError>;

    /// Get a record by device id
    async fn get_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError>;

    /// Number of registered devices
    async fn device_count(&self) -> Result<usize, StorageError>;
}
