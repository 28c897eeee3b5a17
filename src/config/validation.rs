/// Validate the voice-sample splitting settings
///
/// The chunk length and size threshold must both be positive; a zero chunk
/// length would make the chunk count computation divide by zero, and a zero
/// subprocess timeout would kill every media tool invocation immediately.
pub fn validate_split_settings(
    chunk_seconds: f64,
    size_threshold_mb: f64,
    media_tool_timeout_seconds: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    if !chunk_seconds.is_finite() || chunk_seconds <= 0.0 {
        return Err(format!("CHUNK_SECONDS must be a positive number, got {chunk_seconds}").into());
    }
    if !size_threshold_mb.is_finite() || size_threshold_mb <= 0.0 {
        return Err(
            format!("SIZE_THRESHOLD_MB must be a positive number, got {size_threshold_mb}").into(),
        );
    }
    if media_tool_timeout_seconds == 0 {
        return Err("MEDIA_TOOL_TIMEOUT_SECONDS must be at least 1".into());
    }
    Ok(())
}
