//! # Device Trust Core
//!
//! Canonical serialization and signature primitives for device intent
//! proofs.
//!
//! ## Key Concepts
//!
//! - **Canonicalization**: a structured payload becomes one exact byte
//!   string that a device and this service both reproduce
//! - **Device key**: base64 SPKI/DER public key registered per device;
//!   the key type fixes the scheme (ECDSA P-256 or RSA PKCS#1 v1.5, both
//!   over SHA-256)
//! - **Intent proof**: a device's signature over the canonical payload
//!
//! ## Verification Contract
//!
//! Verification is total: every failure is a `NotVerified` outcome
//! carrying an internal `FailureReason`, and only the boolean leaves the
//! process.

pub mod canonical;
pub mod chain;
pub mod crypto;
pub mod error;
pub mod types;

pub use canonical::{canonicalize, canonicalize_with, CanonicalizationPolicy, Canonicalizer};
pub use chain::{ChainValidator, TrustStore, UnvalidatedChain};
pub use crypto::{decode_base64, DevicePublicKey, IntentSigner, KeyAlgorithm};
pub use error::{DeviceTrustError, Result};
pub use types::{DeviceRecord, FailureReason, VerificationOutcome, VerificationResult};
