//! Directory scan for unprocessed voice samples.

use std::path::Path;

use tokio::fs;

use super::{SAMPLE_EXTENSION, SampleState, SplitError};

/// List the unprocessed sample names in `dir`, sorted.
///
/// Chunk outputs and backed-up originals are filtered out by name. A missing
/// directory is created (empty) instead of reported as an error, and an empty
/// directory yields an empty list, which callers treat as a normal terminal
/// state.
pub async fn scan_samples(dir: &Path) -> Result<Vec<String>, SplitError> {
    if !fs::try_exists(dir).await? {
        fs::create_dir_all(dir).await?;
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(SAMPLE_EXTENSION) && SampleState::of(&name) == SampleState::Unprocessed {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
