//! Device Registration Handler
//!
//! Accepts a device's public key, hardware-backed flag and attestation
//! chain and stores them under the device id.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::api::error::ApiError;
use crate::api::handlers::AppState;
use crate::registry::RegisterDevice;

/// Request to register a device
#[derive(Debug, Default, Deserialize)]
pub struct RegisterDeviceRequest {
    /// Device identifier
    #[serde(default)]
    pub device_id: Option<String>,

    /// Base64-encoded SPKI/DER public key
    #[serde(default)]
    pub public_key: Option<String>,

    /// Hardware-backed claim; any JSON value, read by truthiness
    #[serde(default)]
    pub hardware_backed: Option<Value>,

    /// Base64-encoded DER certificates, leaf first
    #[serde(default)]
    pub cert_chain: Option<Vec<String>>,
}

/// Response from device registration
#[derive(Debug, Serialize)]
pub struct RegisterDeviceResponse {
    pub registered: bool,
}

/// JavaScript-style truthiness, as senders of `hardware_backed` expect
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl From<RegisterDeviceRequest> for RegisterDevice {
    fn from(request: RegisterDeviceRequest) -> Self {
        RegisterDevice {
            device_id: request.device_id.unwrap_or_default(),
            public_key: request.public_key.unwrap_or_default(),
            hardware_backed: request.hardware_backed.as_ref().map(truthy).unwrap_or(false),
            cert_chain: request.cert_chain.unwrap_or_default(),
        }
    }
}

/// Register a device public key
///
/// POST /registerDevice
///
/// Re-registering an id replaces the earlier record unless the service runs
/// with the `reject` duplicate policy.
pub async fn register_device(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterDeviceRequest>, JsonRejection>,
) -> Result<Json<RegisterDeviceResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        warn!(error = %rejection, "Unparseable registration body");
        ApiError::BadRequest(rejection.body_text())
    })?;

    state.registrar.register(request.into()).await?;

    Ok(Json(RegisterDeviceResponse { registered: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("yes")));
        assert!(truthy(&json!({})));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&Value::Null));
    }

    #[test]
    fn test_request_defaults() {
        let request: RegisterDeviceRequest =
            serde_json::from_value(json!({ "device_id": "dev-1", "public_key": "a2V5" })).unwrap();
        let register: RegisterDevice = request.into();

        assert_eq!(register.device_id, "dev-1");
        assert!(!register.hardware_backed);
        assert!(register.cert_chain.is_empty());
    }

    #[test]
    fn test_missing_fields_become_empty() {
        let register: RegisterDevice = RegisterDeviceRequest::default().into();
        assert!(register.device_id.is_empty());
        assert!(register.public_key.is_empty());
    }
}
