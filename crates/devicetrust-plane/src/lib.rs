//! Device Trust Plane
//!
//! The device trust plane registers device public keys and verifies that
//! signed intent payloads came from the registered device:
//! - Stores one record per device id (public key, hardware-backed flag,
//!   attestation chain)
//! - Canonicalizes each submitted payload and checks the device's
//!   SHA-256 signature over it
//! - Reports verification as a bare boolean, whatever went wrong
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check with device count and policies
//! - `POST /registerDevice` - Register or replace a device key
//! - `POST /submitIntentProof` - Verify a signed intent payload

pub mod api;
pub mod config;
pub mod core;
pub mod registry;
pub mod storage;

pub use api::create_router;
pub use api::handlers::AppState;
pub use config::{ConfigError, PlaneConfig};
pub use crate::core::{IntentVerifier, VerifyIntent};
pub use registry::{DeviceRegistrar, DuplicatePolicy, RegisterDevice, RegistrationError};
pub use storage::{DeviceStore, MemoryStore, StorageError};
