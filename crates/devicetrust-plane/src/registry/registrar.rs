//! Device Registrar
//!
//! Registers device public keys and resolves device ids to records.
//!
//! - Registration requires a device id and an encoded public key; nothing
//!   else about the key is checked until verification time.
//! - Re-registering an id follows the configured `DuplicatePolicy`.
//! - The attestation chain is stored verbatim; the chain validator's
//!   opinion is recorded but never enforced.

use devicetrust_core::{decode_base64, ChainValidator, DeviceRecord, TrustStore, UnvalidatedChain};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::{DeviceStore, StorageError};

/// What to do when a device id is registered a second time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Replace the existing record (last write wins)
    #[default]
    Overwrite,
    /// Keep the existing record and refuse the new one
    Reject,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::Overwrite => "overwrite",
            DuplicatePolicy::Reject => "reject",
        }
    }
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown duplicate policy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown duplicate policy '{0}' (expected 'overwrite' or 'reject')")]
pub struct ParseDuplicatePolicyError(pub String);

impl FromStr for DuplicatePolicy {
    type Err = ParseDuplicatePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(DuplicatePolicy::Overwrite),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(ParseDuplicatePolicyError(other.to_string())),
        }
    }
}

/// A registration request after transport decoding
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct RegisterDevice {
    pub device_id: String,
    pub public_key: String,
    pub hardware_backed: bool,
    pub cert_chain: Vec<String>,
}

/// Acknowledgement of a successful registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationAck {
    pub device_id: String,
    /// An earlier record with the same id was replaced
    pub replaced: bool,
    pub chain_validated: bool,
}

/// Why a registration was refused
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("missing fields")]
    MissingFields,

    #[error("device '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for RegistrationError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AlreadyExists(id) => RegistrationError::AlreadyRegistered(id),
            other => RegistrationError::Storage(other),
        }
    }
}

/// Why a lookup produced no record
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("device '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Registrar over an injected device store
#[derive(Debug, Clone)]
pub struct DeviceRegistrar {
    store: Arc<dyn DeviceStore>,
    duplicate_policy: DuplicatePolicy,
    chain_validator: Arc<dyn ChainValidator>,
    trust_store: Arc<TrustStore>,
}

impl DeviceRegistrar {
    /// Create a registrar that overwrites duplicates and validates no chains
    pub fn new(store: Arc<dyn DeviceStore>) -> Self {
        Self {
            store,
            duplicate_policy: DuplicatePolicy::default(),
            chain_validator: Arc::new(UnvalidatedChain),
            trust_store: Arc::new(TrustStore::new()),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_chain_validator(
        mut self,
        validator: Arc<dyn ChainValidator>,
        trust_store: TrustStore,
    ) -> Self {
        self.chain_validator = validator;
        self.trust_store = Arc::new(trust_store);
        self
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Register (or re-register) a device
    pub async fn register(
        &self,
        request: RegisterDevice,
    ) -> Result<RegistrationAck, RegistrationError> {
        if request.device_id.is_empty() || request.public_key.is_empty() {
            warn!(
                has_device_id = !request.device_id.is_empty(),
                has_public_key = !request.public_key.is_empty(),
                "Rejected registration with missing fields"
            );
            return Err(RegistrationError::MissingFields);
        }

        let chain_validated = self.validate_chain(&request.device_id, &request.cert_chain);

        let record = DeviceRecord::new(request.device_id, request.public_key)
            .with_hardware_backed(request.hardware_backed)
            .with_cert_chain(request.cert_chain)
            .with_chain_validated(chain_validated);
        let device_id = record.device_id.clone();
        let hardware_backed = record.hardware_backed;

        let replaced = match self.duplicate_policy {
            DuplicatePolicy::Overwrite => self.store.put_device(record).await?.is_some(),
            DuplicatePolicy::Reject => {
                self.store.insert_device(record).await.map_err(|e| {
                    warn!(device_id = %device_id, error = %e, "Rejected duplicate registration");
                    RegistrationError::from(e)
                })?;
                false
            }
        };

        if replaced {
            info!(device_id = %device_id, "Replaced existing device registration");
        }
        info!(
            device_id = %device_id,
            hardware_backed = hardware_backed,
            chain_validated = chain_validated,
            "Registered device"
        );

        Ok(RegistrationAck {
            device_id,
            replaced,
            chain_validated,
        })
    }

    /// Resolve a device id to its record
    pub async fn lookup(&self, device_id: &str) -> Result<DeviceRecord, LookupError> {
        self.store
            .get_device(device_id)
            .await?
            .ok_or_else(|| LookupError::NotFound(device_id.to_string()))
    }

    /// Number of registered devices
    pub async fn device_count(&self) -> Result<usize, StorageError> {
        self.store.device_count().await
    }

    fn validate_chain(&self, device_id: &str, cert_chain: &[String]) -> bool {
        if cert_chain.is_empty() {
            return false;
        }

        let decoded: Result<Vec<Vec<u8>>, _> =
            cert_chain.iter().map(|cert| decode_base64(cert)).collect();
        match decoded {
            Ok(chain) => self.chain_validator.validate(&chain, &self.trust_store),
            Err(e) => {
                debug!(device_id = %device_id, error = %e, "Certificate chain is not base64");
                false
            }
        }
    }
}
