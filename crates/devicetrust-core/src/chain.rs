//! Attestation certificate chain validation
//!
//! Chains are stored with the device record but not trusted. Validation is
//! a separate capability so a real X.509 path validator can be plugged in
//! without touching registration or verification.

use std::fmt::Debug;

/// Trust anchors a chain must terminate in, as DER certificates
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    roots: Vec<Vec<u8>>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trusted root certificate (DER)
    pub fn add_root(&mut self, root_der: Vec<u8>) {
        self.roots.push(root_der);
    }

    pub fn roots(&self) -> &[Vec<u8>] {
        &self.roots
    }
}

/// Decides whether a certificate chain is trusted
pub trait ChainValidator: Send + Sync + Debug {
    /// `chain` is leaf first, DER encoded
    fn validate(&self, chain: &[Vec<u8>], roots: &TrustStore) -> bool;
}

/// Validator used when no chain validation is configured.
///
/// Never vouches for a chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnvalidatedChain;

impl ChainValidator for UnvalidatedChain {
    fn validate(&self, _chain: &[Vec<u8>], _roots: &TrustStore) -> bool {
        false
    }
}
