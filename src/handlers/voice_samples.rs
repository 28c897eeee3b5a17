//! Voice-sample listing and split-trigger endpoints.
//!
//! Both endpoints always answer 200 with a JSON body carrying a `success`
//! flag, matching what the dialog UI expects; `success: false` with a
//! `message` is the normal empty-result signal, `error` marks real failures.

use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde_json::{Value, json};
use tracing::error;

use crate::state::AppState;

/// Handler for GET /api/voice-samples - unprocessed sample names
pub async fn list_voice_samples(State(state): State<Arc<AppState>>) -> Json<Value> {
    match state.splitter.list_unprocessed().await {
        Ok(samples) => Json(json!({
            "success": true,
            "samples": samples,
            "directory": state.splitter.directory().display().to_string(),
        })),
        Err(e) => {
            error!(error = %e, "failed to list voice samples");
            Json(json!({ "success": false, "error": e.to_string() }))
        }
    }
}

/// Handler for POST /api/voice-samples/split - run the split orchestrator once
///
/// The run-in-progress guard turns a concurrent second trigger into an error
/// response instead of letting two runs race over the same renames.
pub async fn split_voice_samples(State(state): State<Arc<AppState>>) -> Json<Value> {
    let Ok(_guard) = state.split_guard.try_lock() else {
        return Json(json!({
            "success": false,
            "error": "A split run is already in progress",
        }));
    };

    match state.splitter.run().await {
        Ok(report) => Json(
            serde_json::to_value(&report)
                .unwrap_or_else(|e| json!({ "success": false, "error": e.to_string() })),
        ),
        Err(e) => {
            error!(error = %e, "voice sample split run failed");
            Json(json!({ "success": false, "error": e.to_string() }))
        }
    }
}
