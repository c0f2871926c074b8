//! Device key material and SHA-256 signature verification
//!
//! Device public keys arrive as base64 SPKI/DER. The signature scheme is
//! implied by the key: an EC key on P-256 means ECDSA over SHA-256 with a
//! DER-encoded signature, an RSA key means RSASSA-PKCS1-v1_5 over SHA-256.
//! Nothing else is accepted.
//!
//! Key types:
//! - `DevicePublicKey`: decoded verification key for a registered device
//! - `IntentSigner`: device-side key pair that signs canonical payloads

use base64::{
    alphabet,
    engine::{general_purpose::STANDARD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use p256::pkcs8::{spki::SubjectPublicKeyInfoRef, DecodePublicKey, EncodePublicKey, ObjectIdentifier};
use rand::rngs::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use signature::{SignatureEncoding, Signer, Verifier};

use crate::canonical::{CanonicalizationPolicy, Canonicalizer};
use crate::error::{DeviceTrustError, Result};

/// rsaEncryption
const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// id-ecPublicKey
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// secp256r1 / prime256v1
const P256_CURVE_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");

/// Base64 decoder that tolerates missing padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode standard-alphabet base64, ignoring ASCII whitespace (line-wrapped
/// output from Android's `Base64.DEFAULT`) and padding.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(DeviceTrustError::Encoding("empty input".into()));
    }
    Ok(LENIENT_BASE64.decode(compact.as_bytes())?)
}

/// Signature scheme implied by a device key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// ECDSA on NIST P-256 with SHA-256
    #[serde(rename = "ecdsa-p256-sha256")]
    EcdsaP256Sha256,
    /// RSASSA-PKCS1-v1_5 with SHA-256
    #[serde(rename = "rsa-pkcs1v15-sha256")]
    RsaPkcs1v15Sha256,
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyAlgorithm::EcdsaP256Sha256 => f.write_str("ecdsa-p256-sha256"),
            KeyAlgorithm::RsaPkcs1v15Sha256 => f.write_str("rsa-pkcs1v15-sha256"),
        }
    }
}

#[derive(Clone)]
enum VerifyingMaterial {
    P256(p256::ecdsa::VerifyingKey),
    Rsa(rsa::pkcs1v15::VerifyingKey<Sha256>),
}

/// Decoded device public key
#[derive(Clone)]
pub struct DevicePublicKey {
    material: VerifyingMaterial,
}

impl std::fmt::Debug for DevicePublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevicePublicKey")
            .field("algorithm", &self.algorithm())
            .finish()
    }
}

impl DevicePublicKey {
    /// Parse a SubjectPublicKeyInfo DER document
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoRef::try_from(der)
            .map_err(|e| DeviceTrustError::MalformedKey(e.to_string()))?;
        let algorithm_oid = spki.algorithm.oid;

        let material = if algorithm_oid == EC_PUBLIC_KEY_OID {
            let curve = spki
                .algorithm
                .parameters_oid()
                .map_err(|e| DeviceTrustError::MalformedKey(e.to_string()))?;
            if curve != P256_CURVE_OID {
                return Err(DeviceTrustError::UnsupportedKeyType(format!(
                    "EC curve {}",
                    curve
                )));
            }
            VerifyingMaterial::P256(p256::ecdsa::VerifyingKey::from_public_key_der(der)?)
        } else if algorithm_oid == RSA_ENCRYPTION_OID {
            let key = RsaPublicKey::from_public_key_der(der)
                .map_err(|e| DeviceTrustError::MalformedKey(e.to_string()))?;
            VerifyingMaterial::Rsa(rsa::pkcs1v15::VerifyingKey::<Sha256>::new(key))
        } else {
            return Err(DeviceTrustError::UnsupportedKeyType(format!(
                "algorithm {}",
                algorithm_oid
            )));
        };

        Ok(Self { material })
    }

    /// Parse a base64-encoded SPKI/DER key
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let der = decode_base64(encoded)?;
        Self::from_spki_der(&der)
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self.material {
            VerifyingMaterial::P256(_) => KeyAlgorithm::EcdsaP256Sha256,
            VerifyingMaterial::Rsa(_) => KeyAlgorithm::RsaPkcs1v15Sha256,
        }
    }

    /// Verify `signature` over `message` (hashed with SHA-256 by the scheme)
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        match &self.material {
            VerifyingMaterial::P256(key) => {
                let signature = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|e| DeviceTrustError::MalformedSignature(e.to_string()))?;
                key.verify(message, &signature)
                    .map_err(|_| DeviceTrustError::SignatureMismatch)
            }
            VerifyingMaterial::Rsa(key) => {
                let signature = rsa::pkcs1v15::Signature::try_from(signature)
                    .map_err(|e| DeviceTrustError::MalformedSignature(e.to_string()))?;
                key.verify(message, &signature)
                    .map_err(|_| DeviceTrustError::SignatureMismatch)
            }
        }
    }

    /// Verify a base64-encoded signature over the canonical form of `payload`
    ///
    /// `payload` must be a JSON object.
    pub fn verify_payload(
        &self,
        payload: &Value,
        policy: CanonicalizationPolicy,
        signature_b64: &str,
    ) -> Result<()> {
        require_object(payload)?;
        let signature = decode_base64(signature_b64)
            .map_err(|e| DeviceTrustError::MalformedSignature(e.to_string()))?;
        let message = Canonicalizer::new(policy).canonicalize(payload);
        self.verify(&message, &signature)
    }
}

/// Intent payloads are mappings; anything else is treated as absent
fn require_object(payload: &Value) -> Result<()> {
    match payload {
        Value::Object(_) => Ok(()),
        _ => Err(DeviceTrustError::MissingField("intent_payload".into())),
    }
}

enum SigningMaterial {
    P256(p256::ecdsa::SigningKey),
    Rsa {
        signing_key: rsa::pkcs1v15::SigningKey<Sha256>,
        public_key: RsaPublicKey,
    },
}

/// Device-side key pair that produces intent proofs
///
/// Plays the role of the remote device: it canonicalizes a payload with
/// the same rules as the verifier and signs the resulting bytes.
pub struct IntentSigner {
    material: SigningMaterial,
    canonicalizer: Canonicalizer,
}

impl std::fmt::Debug for IntentSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentSigner")
            .field("algorithm", &self.algorithm())
            .field("signing_key", &"[redacted]")
            .field("policy", &self.canonicalizer.policy())
            .finish()
    }
}

impl IntentSigner {
    /// Generate a random P-256 key pair
    pub fn generate_p256() -> Self {
        Self {
            material: SigningMaterial::P256(p256::ecdsa::SigningKey::random(&mut OsRng)),
            canonicalizer: Canonicalizer::default(),
        }
    }

    /// Generate a random RSA key pair with the given modulus size
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| DeviceTrustError::Signing(e.to_string()))?;
        Ok(Self::from_rsa_private_key(private_key))
    }

    /// Wrap an existing P-256 signing key
    pub fn from_p256_signing_key(signing_key: p256::ecdsa::SigningKey) -> Self {
        Self {
            material: SigningMaterial::P256(signing_key),
            canonicalizer: Canonicalizer::default(),
        }
    }

    /// Wrap an existing RSA private key
    pub fn from_rsa_private_key(private_key: RsaPrivateKey) -> Self {
        let public_key = private_key.to_public_key();
        Self {
            material: SigningMaterial::Rsa {
                signing_key: rsa::pkcs1v15::SigningKey::<Sha256>::new(private_key),
                public_key,
            },
            canonicalizer: Canonicalizer::default(),
        }
    }

    /// Canonicalize payloads with `policy` instead of the default
    pub fn with_policy(mut self, policy: CanonicalizationPolicy) -> Self {
        self.canonicalizer = Canonicalizer::new(policy);
        self
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self.material {
            SigningMaterial::P256(_) => KeyAlgorithm::EcdsaP256Sha256,
            SigningMaterial::Rsa { .. } => KeyAlgorithm::RsaPkcs1v15Sha256,
        }
    }

    /// SPKI/DER encoding of the public half
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        let document = match &self.material {
            SigningMaterial::P256(key) => key.verifying_key().to_public_key_der(),
            SigningMaterial::Rsa { public_key, .. } => public_key.to_public_key_der(),
        }
        .map_err(|e| DeviceTrustError::MalformedKey(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }

    /// Base64 SPKI/DER public key, the form sent at registration
    pub fn public_key_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(self.public_key_der()?))
    }

    pub fn public_key(&self) -> Result<DevicePublicKey> {
        DevicePublicKey::from_spki_der(&self.public_key_der()?)
    }

    /// Sign raw message bytes
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        match &self.material {
            SigningMaterial::P256(key) => {
                let signature: p256::ecdsa::Signature = key
                    .try_sign(message)
                    .map_err(|e| DeviceTrustError::Signing(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            SigningMaterial::Rsa { signing_key, .. } => {
                let signature = signing_key
                    .try_sign(message)
                    .map_err(|e| DeviceTrustError::Signing(e.to_string()))?;
                Ok(signature.to_vec())
            }
        }
    }

    /// Sign the canonical form of `payload`, returning base64
    ///
    /// `payload` must be a JSON object.
    pub fn sign_payload(&self, payload: &Value) -> Result<String> {
        require_object(payload)?;
        let message = self.canonicalizer.canonicalize(payload);
        Ok(STANDARD.encode(self.sign(&message)?))
    }
}
