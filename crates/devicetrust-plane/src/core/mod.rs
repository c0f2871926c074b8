//! Core logic for the device trust plane

mod verifier;

pub use verifier::{IntentVerifier, VerifyIntent};
