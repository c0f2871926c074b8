//! Intent proof verification
//!
//! This is the composition point of the service: presence checks, device
//! lookup, canonicalization, key and signature decoding, and the signature
//! check itself. Every failure becomes `NotVerified(reason)`. The reason is
//! logged here, where it happens, and goes no further: callers only ever
//! learn the boolean.

use devicetrust_core::{
    decode_base64, CanonicalizationPolicy, Canonicalizer, DevicePublicKey, DeviceTrustError,
    FailureReason, VerificationOutcome,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::registry::{DeviceRegistrar, LookupError};

/// An intent proof submission. `None`, empty strings and a payload that is
/// not a JSON object all count as missing.
#[derive(Debug, Clone, Default)]
pub struct VerifyIntent {
    pub device_id: Option<String>,
    pub intent_payload: Option<Value>,
    pub signature: Option<String>,
}

impl VerifyIntent {
    pub fn new(
        device_id: impl Into<String>,
        intent_payload: Value,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            device_id: Some(device_id.into()),
            intent_payload: Some(intent_payload),
            signature: Some(signature.into()),
        }
    }
}

/// Verifies intent proofs against registered device keys
#[derive(Debug, Clone)]
pub struct IntentVerifier {
    registrar: DeviceRegistrar,
    canonicalizer: Canonicalizer,
}

impl IntentVerifier {
    pub fn new(registrar: DeviceRegistrar, policy: CanonicalizationPolicy) -> Self {
        Self {
            registrar,
            canonicalizer: Canonicalizer::new(policy),
        }
    }

    pub fn policy(&self) -> CanonicalizationPolicy {
        self.canonicalizer.policy()
    }

    /// Check an intent proof. Never fails; see `VerificationOutcome`.
    pub async fn verify(&self, request: &VerifyIntent) -> VerificationOutcome {
        let outcome = self.check(request).await;
        let device_id = request.device_id.as_deref().unwrap_or("");

        match outcome {
            VerificationOutcome::Verified => {
                info!(device_id = %device_id, "Intent proof verified");
            }
            VerificationOutcome::NotVerified(reason) => {
                warn!(device_id = %device_id, reason = %reason, "Intent proof not verified");
            }
        }

        outcome
    }

    async fn check(&self, request: &VerifyIntent) -> VerificationOutcome {
        use VerificationOutcome::NotVerified;

        let Some(device_id) = non_empty(request.device_id.as_deref()) else {
            return NotVerified(FailureReason::MissingDeviceId);
        };
        // Only a JSON object is an intent; scalars and arrays count as missing
        let payload = match request.intent_payload.as_ref() {
            Some(payload @ Value::Object(_)) => payload,
            _ => return NotVerified(FailureReason::MissingPayload),
        };
        let Some(signature_b64) = non_empty(request.signature.as_deref()) else {
            return NotVerified(FailureReason::MissingSignature);
        };

        let record = match self.registrar.lookup(device_id).await {
            Ok(record) => record,
            Err(LookupError::NotFound(_)) => return NotVerified(FailureReason::UnknownDevice),
            Err(LookupError::Storage(e)) => {
                error!(device_id = %device_id, error = %e, "Device store unavailable during verification");
                return NotVerified(FailureReason::StoreUnavailable);
            }
        };

        let message = self.canonicalizer.canonicalize(payload);
        debug!(
            device_id = %device_id,
            policy = %self.canonicalizer.policy(),
            message_len = message.len(),
            "Canonicalized intent payload"
        );

        let key = match DevicePublicKey::from_base64(&record.public_key) {
            Ok(key) => key,
            Err(e) => {
                // The stored key was accepted at registration; this is an operator problem
                error!(device_id = %device_id, error = %e, "Stored device key is unusable");
                return NotVerified(key_failure(&e));
            }
        };

        let signature = match decode_base64(signature_b64) {
            Ok(signature) => signature,
            Err(_) => return NotVerified(FailureReason::MalformedSignature),
        };

        match key.verify(&message, &signature) {
            Ok(()) => VerificationOutcome::Verified,
            Err(e) => NotVerified(signature_failure(&e)),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn key_failure(err: &DeviceTrustError) -> FailureReason {
    match err {
        DeviceTrustError::UnsupportedKeyType(_) => FailureReason::UnsupportedKeyType,
        _ => FailureReason::MalformedPublicKey,
    }
}

fn signature_failure(err: &DeviceTrustError) -> FailureReason {
    match err {
        DeviceTrustError::MalformedSignature(_) | DeviceTrustError::Encoding(_) => {
            FailureReason::MalformedSignature
        }
        _ => FailureReason::SignatureMismatch,
    }
}
