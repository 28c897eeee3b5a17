//! In-memory message and training-data store.
//!
//! The store is owned by [`crate::state::AppState`] and shared with handlers
//! through it, rather than living as module-level state. Messages can
//! optionally be mirrored to a flat JSON file so they survive a restart;
//! training data is memory only.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub content: String,
    pub role: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "empty_object")]
    pub metadata: Value,
}

/// One persona training-data entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingData {
    pub id: u64,
    pub content: String,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

#[derive(Default)]
struct Inner {
    messages: BTreeMap<u64, Message>,
    training_data: BTreeMap<u64, TrainingData>,
    memory: BTreeMap<String, Value>,
    next_message_id: u64,
    next_training_id: u64,
}

/// Process-wide store with incrementing integer keys.
pub struct MemStore {
    inner: RwLock<Inner>,
    messages_path: Option<PathBuf>,
}

impl MemStore {
    /// Create a store, loading previously persisted messages when
    /// `messages_path` points at an existing file.
    ///
    /// A corrupt file is logged and ignored; the store starts empty rather
    /// than refusing to boot.
    pub fn new(messages_path: Option<PathBuf>) -> Self {
        let mut inner = Inner {
            next_message_id: 1,
            next_training_id: 1,
            ..Default::default()
        };

        if let Some(path) = &messages_path {
            match fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<Vec<Message>>(&data) {
                    Ok(messages) => {
                        for message in messages {
                            inner.next_message_id = inner.next_message_id.max(message.id + 1);
                            inner.messages.insert(message.id, message);
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "ignoring corrupt messages file");
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read messages file");
                }
            }
        }

        Self {
            inner: RwLock::new(inner),
            messages_path,
        }
    }

    /// All messages in insertion (and therefore timestamp) order.
    pub fn messages(&self) -> Vec<Message> {
        self.inner.read().messages.values().cloned().collect()
    }

    pub fn add_message(&self, content: String, role: String, metadata: Value) -> Message {
        let mut inner = self.inner.write();
        let id = inner.next_message_id;
        inner.next_message_id += 1;

        let message = Message {
            id,
            content,
            role,
            timestamp: Utc::now(),
            metadata,
        };
        inner.messages.insert(id, message.clone());
        self.persist(&inner);
        message
    }

    pub fn training_data(&self) -> Vec<TrainingData> {
        self.inner.read().training_data.values().cloned().collect()
    }

    pub fn add_training_data(&self, content: String, category: String) -> TrainingData {
        let mut inner = self.inner.write();
        let id = inner.next_training_id;
        inner.next_training_id += 1;

        let data = TrainingData {
            id,
            content,
            category,
            timestamp: Utc::now(),
        };
        inner.training_data.insert(id, data.clone());
        data
    }

    /// Snapshot of the persona memory map.
    pub fn memory(&self) -> BTreeMap<String, Value> {
        self.inner.read().memory.clone()
    }

    pub fn update_memory(&self, key: String, value: Value) {
        self.inner.write().memory.insert(key, value);
    }

    /// Mirror the current messages to the flat JSON file, when configured.
    ///
    /// Persistence failures are logged but never fail the request that
    /// triggered them.
    fn persist(&self, inner: &Inner) {
        let Some(path) = &self.messages_path else {
            return;
        };
        let messages: Vec<&Message> = inner.messages.values().collect();
        match serde_json::to_string_pretty(&messages) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    warn!(path = %path.display(), error = %e, "failed to persist messages");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode messages"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_message_ids_increment_from_one() {
        let store = MemStore::new(None);
        let first = store.add_message("hi".into(), "user".into(), empty_object());
        let second = store.add_message("hello".into(), "assistant".into(), empty_object());

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.messages().len(), 2);
    }

    #[test]
    fn test_messages_listed_in_insertion_order() {
        let store = MemStore::new(None);
        for content in ["a", "b", "c"] {
            store.add_message(content.into(), "user".into(), empty_object());
        }
        let contents: Vec<String> = store.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_messages_survive_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.json");

        {
            let store = MemStore::new(Some(path.clone()));
            store.add_message("hi".into(), "user".into(), json!({"tone": "warm"}));
        }

        let store = MemStore::new(Some(path));
        let messages = store.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[0].metadata["tone"], "warm");

        // Ids keep counting past the reloaded ones
        let next = store.add_message("again".into(), "user".into(), empty_object());
        assert_eq!(next.id, 2);
    }

    #[test]
    fn test_corrupt_messages_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.json");
        fs::write(&path, "not json").unwrap();

        let store = MemStore::new(Some(path));
        assert!(store.messages().is_empty());
    }

    #[test]
    fn test_memory_updates_overwrite_keys() {
        let store = MemStore::new(None);
        store.update_memory("mood".into(), json!("cheerful"));
        store.update_memory("mood".into(), json!("curious"));
        store.update_memory("topic".into(), json!({"last": "voice training"}));

        let memory = store.memory();
        assert_eq!(memory.len(), 2);
        assert_eq!(memory["mood"], "curious");
        assert_eq!(memory["topic"]["last"], "voice training");
    }

    #[test]
    fn test_training_data_round_trip() {
        let store = MemStore::new(None);
        let entry = store.add_training_data("stay upbeat".into(), "personality".into());
        assert_eq!(entry.id, 1);

        let all = store.training_data();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].category, "personality");
    }
}
