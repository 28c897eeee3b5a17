use std::env;
use std::path::PathBuf;

use super::ServerConfig;
use super::validation::validate_split_settings;

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// # Returns
    /// * `Result<Self, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - Numeric environment variables are malformed
    /// - The splitting policy is invalid (non-positive chunk length or threshold)
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        // Server configuration
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid port number: {e}"))?;

        // Voice-sample configuration
        let samples_dir = env::var("VOICE_SAMPLES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("training-data/voice-samples"));
        let chunk_seconds = env::var("CHUNK_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<f64>()
            .map_err(|e| format!("Invalid CHUNK_SECONDS: {e}"))?;
        let size_threshold_mb = env::var("SIZE_THRESHOLD_MB")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<f64>()
            .map_err(|e| format!("Invalid SIZE_THRESHOLD_MB: {e}"))?;

        // External media tools
        let ffmpeg_path = env::var("FFMPEG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("ffmpeg"));
        let ffprobe_path = env::var("FFPROBE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("ffprobe"));
        let media_tool_timeout_seconds = env::var("MEDIA_TOOL_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        // Message persistence
        let messages_path = env::var("MESSAGES_PATH").ok().map(PathBuf::from);

        // Image generation provider
        let huggingface_api_key = env::var("HUGGINGFACE_API_KEY").ok();

        validate_split_settings(chunk_seconds, size_threshold_mb, media_tool_timeout_seconds)?;

        Ok(ServerConfig {
            host,
            port,
            samples_dir,
            chunk_seconds,
            size_threshold_mb,
            ffmpeg_path,
            ffprobe_path,
            media_tool_timeout_seconds,
            messages_path,
            huggingface_api_key,
        })
    }
}
