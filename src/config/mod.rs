//! Configuration module for the Cyn server
//!
//! Configuration is loaded from environment variables (with a `.env` file
//! picked up when present). Every knob has a sensible default so the server
//! starts with no configuration at all.
//!
//! # Modules
//! - `env`: environment variable loading
//! - `validation`: configuration validation logic

use std::path::PathBuf;

mod env;
mod validation;

/// Server configuration
///
/// Contains all configuration needed to run the Cyn server, including:
/// - Server settings (host, port)
/// - Voice-sample splitting policy (chunk length, size threshold)
/// - Media tool settings (ffmpeg/ffprobe paths, subprocess timeout)
/// - Message persistence path
/// - Image-generation provider key
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Voice-sample settings
    pub samples_dir: PathBuf,
    pub chunk_seconds: f64,
    pub size_threshold_mb: f64,

    // External media tool settings
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub media_tool_timeout_seconds: u64,

    // Message persistence (None keeps messages in memory only)
    pub messages_path: Option<PathBuf>,

    // Image generation provider
    pub huggingface_api_key: Option<String>,
}

impl ServerConfig {
    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
