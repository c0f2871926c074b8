//! Intent Proof Handler
//!
//! Answers every submission with HTTP 200 and `{"verified": bool}`. A body
//! that does not even parse gets the same answer as a bad signature.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use devicetrust_core::VerificationResult;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::api::handlers::AppState;
use crate::core::VerifyIntent;

/// Intent proof submitted by a device
#[derive(Debug, Default, Deserialize)]
pub struct SubmitIntentProofRequest {
    #[serde(default)]
    pub device_id: Option<String>,

    /// Structured payload the signature covers
    #[serde(default)]
    pub intent_payload: Option<Value>,

    /// Base64-encoded signature over the canonical payload
    #[serde(default)]
    pub signature: Option<String>,
}

impl From<SubmitIntentProofRequest> for VerifyIntent {
    fn from(request: SubmitIntentProofRequest) -> Self {
        VerifyIntent {
            device_id: request.device_id,
            intent_payload: request.intent_payload,
            signature: request.signature,
        }
    }
}

/// Verify an intent proof
///
/// POST /submitIntentProof
pub async fn submit_intent_proof(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SubmitIntentProofRequest>, JsonRejection>,
) -> Json<VerificationResult> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "Unparseable intent proof body");
            return Json(VerificationResult { verified: false });
        }
    };

    let outcome = state.verifier.verify(&request.into()).await;
    Json(outcome.into())
}
