use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::core::splitter::{FfmpegTool, SampleSplitter, SplitPolicy};
use crate::storage::MemStore;

/// Application state that can be shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    /// Message and training-data store
    pub store: MemStore,
    /// Voice-sample split orchestrator
    pub splitter: SampleSplitter,
    /// Guards against two concurrent split runs renaming the same files
    pub split_guard: Mutex<()>,
    /// Shared HTTP client for outbound provider calls
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let tool = Arc::new(FfmpegTool::new(
            config.ffmpeg_path.clone(),
            config.ffprobe_path.clone(),
            Duration::from_secs(config.media_tool_timeout_seconds),
        ));
        let splitter = SampleSplitter::new(
            config.samples_dir.clone(),
            SplitPolicy {
                chunk_seconds: config.chunk_seconds,
                size_threshold_mb: config.size_threshold_mb,
            },
            tool,
        );
        let store = MemStore::new(config.messages_path.clone());

        Arc::new(Self {
            config,
            store,
            splitter,
            split_guard: Mutex::new(()),
            http: reqwest::Client::new(),
        })
    }
}
