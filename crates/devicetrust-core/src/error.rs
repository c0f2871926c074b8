//! Error types for the device trust core

use thiserror::Error;

/// Result type alias using DeviceTrustError
pub type Result<T> = std::result::Result<T, DeviceTrustError>;

/// Errors that can occur while decoding keys, signatures and payloads
#[derive(Error, Debug)]
pub enum DeviceTrustError {
    /// Public key or signature was not valid base64
    #[error("Invalid base64 encoding: {0}")]
    Encoding(String),

    /// SPKI/DER public key could not be parsed
    #[error("Malformed public key: {0}")]
    MalformedKey(String),

    /// Key algorithm is not one this verifier supports
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// Signature bytes could not be parsed for the key's scheme
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// Signature parsed but does not match the message under the key
    #[error("Signature verification failed")]
    SignatureMismatch,

    /// Signing failed on the device side
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Required field absent, or present with the wrong shape
    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl From<base64::DecodeError> for DeviceTrustError {
    fn from(err: base64::DecodeError) -> Self {
        DeviceTrustError::Encoding(err.to_string())
    }
}

impl From<p256::pkcs8::spki::Error> for DeviceTrustError {
    fn from(err: p256::pkcs8::spki::Error) -> Self {
        DeviceTrustError::MalformedKey(err.to_string())
    }
}
