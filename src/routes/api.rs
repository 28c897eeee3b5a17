use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{images, messages, training_data, voice_samples};
use crate::state::AppState;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/messages",
            get(messages::list_messages).post(messages::add_message),
        )
        .route(
            "/api/training-data",
            get(training_data::list_training_data).post(training_data::add_training_data),
        )
        .route("/api/generate-image", post(images::generate_image))
        .route(
            "/api/voice-samples",
            get(voice_samples::list_voice_samples),
        )
        .route(
            "/api/voice-samples/split",
            post(voice_samples::split_voice_samples),
        )
        .layer(TraceLayer::new_for_http())
}
