//! Image generation endpoint backed by the Hugging Face inference API.

use std::sync::Arc;

use axum::{extract::State, response::Json};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::errors::app_error::AppError;
use crate::state::AppState;

const MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0";

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
}

/// Handler for POST /api/generate-image
///
/// Forwards the prompt to the Hugging Face text-to-image model and returns
/// the generated image inline as a base64 data URL.
pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateImageRequest>,
) -> Result<Json<Value>, AppError> {
    if payload.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("Prompt is required".to_string()));
    }

    let description: String = payload.prompt.chars().take(50).collect::<String>() + "...";

    info!("Using Hugging Face's text-to-image model");
    let mut request = state.http.post(MODEL_URL).json(&json!({
        "inputs": payload.prompt,
        "options": { "wait_for_model": true }
    }));
    if let Some(key) = &state.config.huggingface_api_key {
        request = request.bearer_auth(key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| AppError::InternalServerError(format!("Image provider request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(AppError::InternalServerError(format!(
            "Hugging Face API returned {}",
            response.status()
        )));
    }

    // The response body is the image bytes directly
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::InternalServerError(format!("Failed to read image bytes: {e}")))?;
    let image_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(&bytes));

    Ok(Json(json!({
        "success": true,
        "imageUrl": image_url,
        "description": description,
        "message": "Image generated successfully with Hugging Face Stable Diffusion"
    })))
}
