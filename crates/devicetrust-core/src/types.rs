//! Device records and verification outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered device
///
/// Created or replaced only by registration; read-only during verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Opaque device identifier (primary key)
    pub device_id: String,

    /// Base64 SPKI/DER public key, stored exactly as registered
    pub public_key: String,

    /// Whether the device claims a hardware-held key (informational only)
    pub hardware_backed: bool,

    /// Attestation certificate chain, base64 DER blobs in the order received
    pub cert_chain: Vec<String>,

    /// Result of the configured chain validator at registration time
    pub chain_validated: bool,

    /// When this record was written
    pub registered_at: DateTime<Utc>,
}

impl DeviceRecord {
    pub fn new(device_id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            public_key: public_key.into(),
            hardware_backed: false,
            cert_chain: Vec::new(),
            chain_validated: false,
            registered_at: Utc::now(),
        }
    }

    pub fn with_hardware_backed(mut self, hardware_backed: bool) -> Self {
        self.hardware_backed = hardware_backed;
        self
    }

    pub fn with_cert_chain(mut self, cert_chain: Vec<String>) -> Self {
        self.cert_chain = cert_chain;
        self
    }

    pub fn with_chain_validated(mut self, chain_validated: bool) -> Self {
        self.chain_validated = chain_validated;
        self
    }
}

/// Internal reason a verification did not succeed
///
/// Only ever logged. Callers see `VerificationResult { verified: false }`
/// no matter which of these occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    MissingDeviceId,
    MissingPayload,
    MissingSignature,
    UnknownDevice,
    StoreUnavailable,
    MalformedPublicKey,
    UnsupportedKeyType,
    MalformedSignature,
    SignatureMismatch,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::MissingDeviceId => "missing_device_id",
            FailureReason::MissingPayload => "missing_payload",
            FailureReason::MissingSignature => "missing_signature",
            FailureReason::UnknownDevice => "unknown_device",
            FailureReason::StoreUnavailable => "store_unavailable",
            FailureReason::MalformedPublicKey => "malformed_public_key",
            FailureReason::UnsupportedKeyType => "unsupported_key_type",
            FailureReason::MalformedSignature => "malformed_signature",
            FailureReason::SignatureMismatch => "signature_mismatch",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an intent proof check. There is no error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    NotVerified(FailureReason),
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified)
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            VerificationOutcome::Verified => None,
            VerificationOutcome::NotVerified(reason) => Some(*reason),
        }
    }
}

/// The externally visible verification response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
}

impl From<VerificationOutcome> for VerificationResult {
    fn from(outcome: VerificationOutcome) -> Self {
        Self {
            verified: outcome.is_verified(),
        }
    }
}
