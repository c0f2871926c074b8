//! In-memory storage backend
//!
//! Default storage implementation using a single hashmap behind one
//! `RwLock`. Suitable for development and single-instance deployments.
//! Data is lost on restart.

use async_trait::async_trait;
use devicetrust_core::DeviceRecord;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use super::{DeviceStore, StorageError};

/// In-memory device store implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    devices: RwLock<HashMap<String, DeviceRecord>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(err: PoisonError<T>) -> StorageError {
    StorageError::Poisoned(err.to_string())
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn put_device(&self, record: DeviceRecord) -> Result<Option<DeviceRecord>, StorageError> {
        let mut devices = self.devices.write().map_err(poisoned)?;
        debug!(device_id = %record.device_id, "Storing device record");
        Ok(devices.insert(record.device_id.clone(), record))
    }

    async fn insert_device(&self, record: DeviceRecord) -> Result<(), StorageError> {
        let mut devices = self.devices.write().map_err(poisoned)?;
        if devices.contains_key(&record.device_id) {
            return Err(StorageError::AlreadyExists(record.device_id));
        }
        debug!(device_id = %record.device_id, "Storing new device record");
        devices.insert(record.device_id.clone(), record);
        Ok(())
    }

    async fn get_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError> {
        let devices = self.devices.read().map_err(poisoned)?;
        Ok(devices.get(device_id).cloned())
    }

    async fn device_count(&self) -> Result<usize, StorageError> {
        let devices = self.devices.read().map_err(poisoned)?;
        Ok(devices.len())
    }
}
