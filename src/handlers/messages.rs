use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::app_error::AppError;
use crate::state::AppState;
use crate::storage::Message;

#[derive(Debug, Deserialize)]
pub struct NewMessage {
    pub content: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Handler for GET /api/messages - all messages in timestamp order
pub async fn list_messages(State(state): State<Arc<AppState>>) -> Json<Vec<Message>> {
    Json(state.store.messages())
}

/// Handler for POST /api/messages - append one message
pub async fn add_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewMessage>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::BadRequest("Content is required".to_string()));
    }

    let message = state.store.add_message(
        payload.content,
        payload.role.unwrap_or_else(|| "user".to_string()),
        payload
            .metadata
            .unwrap_or_else(|| Value::Object(Default::default())),
    );

    Ok((StatusCode::CREATED, Json(message)))
}
