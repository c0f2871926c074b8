//! API request handlers

pub mod register;
pub mod verify;

pub use register::{register_device, RegisterDeviceRequest, RegisterDeviceResponse};
pub use verify::{submit_intent_proof, SubmitIntentProofRequest};

use crate::config::PlaneConfig;
use crate::core::IntentVerifier;
use crate::registry::DeviceRegistrar;

/// Application state shared across handlers
///
/// Built once at startup; registrar and verifier share one device store.
pub struct AppState {
    pub registrar: DeviceRegistrar,
    pub verifier: IntentVerifier,
}

impl AppState {
    /// Wire a registrar and verifier over the same store, applying the
    /// configured duplicate and canonicalization policies
    pub fn new(registrar: DeviceRegistrar, config: &PlaneConfig) -> Self {
        let registrar = registrar.with_duplicate_policy(config.duplicate_policy);
        let verifier = IntentVerifier::new(registrar.clone(), config.canonicalization);
        Self {
            registrar,
            verifier,
        }
    }
}
