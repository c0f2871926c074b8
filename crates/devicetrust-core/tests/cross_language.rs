//! Cross-language verification tests
//!
//! Keys and signatures below were produced by Node's `crypto` module
//! (`createSign("SHA256")`, SPKI/DER export) over the canonical bytes of
//! `{"action":"unlock","ts":1700000000}`.

use base64::{engine::general_purpose::STANDARD, Engine};
use devicetrust_core::{
    canonicalize, CanonicalizationPolicy, DevicePublicKey, DeviceTrustError, IntentSigner,
    KeyAlgorithm,
};
use serde_json::{json, Value};

const EC_SPKI: &str = "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEHlwgwkBJdAQ5NI8+KlvZnvr8J5NXiwU7UuO/dNJgc68mkMKfdidvFhI/Efw5mJro995HXDrPkxBpbNsdFZXEDQ==";
const EC_SIG: &str = "MEQCICycYTI/UNUbKd2DBk95Di08+3k2zOuHv9ZALqHADUVCAiAnzxTEmg8yFDOAHs/UxSURF/jwVg3WR885gap5EhDbdQ==";

const RSA_SPKI: &str = "MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAyVCTwpievfml7ebnKHAC46VGFGLwYcmJJRbiTxHY/IN1cxLMBZbIq/yOSEnDL/l2V+zH8Tb7DGBU9SUF1c2xUP0pgtciEtPs9XhTmhCK2gMzOxYDQQTm9fLiAZDGXZNbaJB1/4VI6rkvtl59uqvBImLzLSB0XcqbPp3O/KBLtb6OaFanEV1JmfL8K4g8ZenoMScbL4XafeO6Wikiznhwu9Uf5q6XmK4q2MvrVURvFlV9ZKvLZbVumxmrkvQiONxBxTYUQiXBERtPG8f8k7bUjP9IO6Z07UJ0pZb1BVhKXt8U/Dp3R0gEQq+zRvtmVUMJ0gSgknNsDpRHm/qmF55QlQIDAQAB";
const RSA_SIG: &str = "UxBrW8u25ghMdjm/zHQFoTPuiGDW4J/MGuP+DPXfDHTFGR5vvwbSalpS8F45rSKrIyc0JU0XWWp4g6mp6M4Blw3aZ1vigvRdbfRWFBe0qb3V9Fomr+epCoyqIix8+GcUAsa+fologCP+iaG2FeUr53MUENAQqS09/pMAiQHj13TA5ufm3NVP94CfxQKDOosd7NylKCNIzi/hNx5O8AWIinw94vuzWEj1MMM5yaZvYb9G1xDr7Vtm2+Rirv1gzMrBPZgP+aLPOi6KlxuiRhQlszt+o+hXVHxXX9dMFdnyhUmJSP15dvYRkNUnBonwhT/+YRv/TWc9sCfL7VzvnfYa+A==";

const P384_SPKI: &str = "MHYwEAYHKoZIzj0CAQYFK4EEACIDYgAEMruXd+zSvC21KDbEt5C3i2GqW7h65IFl7G+HLzJretGRndIADNr+bo8HnB+2LatCERBL62zSEH8Tie0lx8b1KEW8JIjd5NpE6EN/HWxeIcyXCC/ICtKvvhTRbqkGo4ya";

#[test]
fn canonical_bytes_match_javascript() {
    let payload = json!({ "ts": 1700000000, "action": "unlock" });
    assert_eq!(canonicalize(&payload), br#"{"action":"unlock","ts":1700000000}"#.to_vec());
}

#[test]
fn javascript_number_forms() {
    // JSON.stringify([1.0, 0.1, 1e21, 1e20, 1e-7, 0.000001, 1.5e-7, 123.456, 2**53])
    let payload = json!([1.0, 0.1, 1e21, 1e20, 1e-7, 0.000001, 1.5e-7, 123.456, 9007199254740992.0]);
    assert_eq!(
        String::from_utf8(canonicalize(&payload)).unwrap(),
        "[1,0.1,1e+21,100000000000000000000,1e-7,0.000001,1.5e-7,123.456,9007199254740992]"
    );
}

#[test]
fn verify_node_ecdsa_signature() {
    let key = DevicePublicKey::from_base64(EC_SPKI).expect("EC SPKI should decode");
    assert_eq!(key.algorithm(), KeyAlgorithm::EcdsaP256Sha256);

    let payload = json!({ "action": "unlock", "ts": 1700000000 });
    key.verify_payload(&payload, CanonicalizationPolicy::Deep, EC_SIG)
        .expect("Node ECDSA signature should verify in Rust");
}

#[test]
fn verify_node_rsa_signature() {
    let key = DevicePublicKey::from_base64(RSA_SPKI).expect("RSA SPKI should decode");
    assert_eq!(key.algorithm(), KeyAlgorithm::RsaPkcs1v15Sha256);

    let payload = json!({ "ts": 1700000000, "action": "unlock" });
    key.verify_payload(&payload, CanonicalizationPolicy::Deep, RSA_SIG)
        .expect("Node RSA signature should verify in Rust");
}

#[test]
fn node_signature_rejects_changed_timestamp() {
    let payload = json!({ "action": "unlock", "ts": 1700000001 });

    for (spki, sig) in [(EC_SPKI, EC_SIG), (RSA_SPKI, RSA_SIG)] {
        let key = DevicePublicKey::from_base64(spki).unwrap();
        let result = key.verify_payload(&payload, CanonicalizationPolicy::Deep, sig);
        assert!(matches!(result, Err(DeviceTrustError::SignatureMismatch)));
    }
}

#[test]
fn signature_under_other_key_type_is_malformed() {
    let key = DevicePublicKey::from_base64(RSA_SPKI).unwrap();
    let payload = json!({ "action": "unlock", "ts": 1700000000 });

    assert!(key
        .verify_payload(&payload, CanonicalizationPolicy::Deep, EC_SIG)
        .is_err());
}

#[test]
fn p384_keys_are_unsupported() {
    assert!(matches!(
        DevicePublicKey::from_base64(P384_SPKI),
        Err(DeviceTrustError::UnsupportedKeyType(_))
    ));
}

#[test]
fn device_wire_bytes_survive_parsing() {
    // A device signs exactly what JSON.stringify gave it; the service only
    // sees the parsed value and must rebuild the same bytes.
    let wires = [
        r#"{"amount":960388.4794005115}"#,
        r#"{"amount":1.079907802215119e-66}"#,
        r#"{"lat":51.50735091,"lon":-0.12775829}"#,
        r#"{"amount":0.30000000000000004,"currency":"EUR"}"#,
    ];
    let signer = IntentSigner::generate_p256();
    let key = signer.public_key().unwrap();

    for wire in wires {
        let signature = STANDARD.encode(signer.sign(wire.as_bytes()).unwrap());
        let parsed: Value = serde_json::from_str(wire).unwrap();

        assert_eq!(canonicalize(&parsed), wire.as_bytes().to_vec(), "{wire}");
        key.verify_payload(&parsed, CanonicalizationPolicy::Deep, &signature)
            .unwrap_or_else(|e| panic!("{wire} did not verify: {e}"));
    }
}
