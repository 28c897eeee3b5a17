use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;

use crate::errors::app_error::AppError;
use crate::state::AppState;
use crate::storage::TrainingData;

#[derive(Debug, Deserialize)]
pub struct NewTrainingData {
    pub content: String,
    pub category: String,
}

/// Handler for GET /api/training-data
pub async fn list_training_data(State(state): State<Arc<AppState>>) -> Json<Vec<TrainingData>> {
    Json(state.store.training_data())
}

/// Handler for POST /api/training-data
pub async fn add_training_data(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewTrainingData>,
) -> Result<(StatusCode, Json<TrainingData>), AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::BadRequest("Content is required".to_string()));
    }
    if payload.category.trim().is_empty() {
        return Err(AppError::BadRequest("Category is required".to_string()));
    }

    let data = state
        .store
        .add_training_data(payload.content, payload.category);

    Ok((StatusCode::CREATED, Json(data)))
}
