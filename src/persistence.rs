use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Task;

/// Key the task collection is stored under, as one JSON array
pub const TASKS_KEY: &str = "tasks";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to create storage directory: {0}")]
    Directory(String),
    #[error("Failed to serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Synchronous key-value storage for serialized blobs
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process blob store. Counts writes so callers can observe persistence.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RefCell<HashMap<String, String>>,
    writes: Cell<usize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing the write counter
    pub fn with_blob(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Number of successful `set` calls
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl<B: BlobStore + ?Sized> BlobStore for Box<B> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

pub fn serialize_tasks(tasks: &[Task]) -> Result<String, StorageError> {
    Ok(serde_json::to_string(tasks)?)
}

/// Parse a stored blob. A blob that is not a JSON array yields an empty
/// collection. Records that do not parse as tasks are skipped.
pub fn deserialize_tasks(blob: &str) -> Vec<Task> {
    let records = match serde_json::from_str::<Vec<serde_json::Value>>(blob) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "stored task list is corrupt, starting empty");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Task>(record) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable stored task");
                None
            }
        })
        .collect()
}

/// Load the task collection in stored order
pub fn load_tasks(store: &dyn BlobStore) -> Vec<Task> {
    match store.get(TASKS_KEY) {
        Ok(Some(blob)) => {
            let tasks = deserialize_tasks(&blob);
            debug!(count = tasks.len(), "loaded tasks");
            tasks
        }
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "failed to read stored tasks, starting empty");
            Vec::new()
        }
    }
}

pub fn save_tasks(store: &dyn BlobStore, tasks: &[Task]) -> Result<(), StorageError> {
    let blob = serialize_tasks(tasks)?;
    store.set(TASKS_KEY, &blob)?;
    debug!(count = tasks.len(), "saved tasks");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskFields, TaskId};
    use chrono::{TimeZone, Utc};

    fn task(id: i64, title: &str, description: &str, completed: bool) -> Task {
        let mut task = Task::new(
            TaskId(id),
            TaskFields::new(title, description, "2025-01-10", "09:00"),
            Utc.with_ymd_and_hms(2025, 1, 1, 8, 30, 15).unwrap(),
        );
        task.completed = completed;
        task
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let tasks = vec![
            task(1, "Café crème", "Ünïcödé ✓ 日本語", false),
            task(2, "Second", "", true),
        ];
        let blob = serialize_tasks(&tasks).unwrap();
        assert_eq!(deserialize_tasks(&blob), tasks);
    }

    #[test]
    fn round_trip_empty_collection() {
        let blob = serialize_tasks(&[]).unwrap();
        assert_eq!(blob, "[]");
        assert!(deserialize_tasks(&blob).is_empty());
    }

    #[test]
    fn garbage_blob_loads_empty() {
        assert!(deserialize_tasks("{not json").is_empty());
        assert!(deserialize_tasks("{\"tasks\": 3}").is_empty());
        assert!(deserialize_tasks("[{\"id\": \"x\"}]").is_empty());

        let store = MemoryBlobStore::with_blob(TASKS_KEY, "\u{0}\u{1}garbage");
        assert!(load_tasks(&store).is_empty());
    }

    #[test]
    fn bad_record_is_skipped_and_rest_kept() {
        let blob = r#"[
            {"id":1,"title":"Good","description":"","date":"2025-01-10","time":"09:00",
             "completed":false,"createdAt":"2025-01-09T10:11:12Z"},
            {"id":2,"title":"No created","date":"2025-01-10","time":"09:00"},
            {"id":3,"title":"Null date","date":null,"time":"09:00",
             "createdAt":"2025-01-09T10:11:12Z"},
            {"id":4,"title":"Also good","date":"2025-01-11","time":"10:00",
             "createdAt":"2025-01-09T10:11:12Z"}
        ]"#;
        let tasks = deserialize_tasks(blob);
        let ids: Vec<i64> = tasks.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(tasks[1].title, "Also good");
        assert!(!tasks[1].completed);

        let store = MemoryBlobStore::with_blob(TASKS_KEY, blob);
        assert_eq!(load_tasks(&store).len(), 2);
    }

    #[test]
    fn missing_key_loads_empty() {
        let store = MemoryBlobStore::new();
        assert!(load_tasks(&store).is_empty());
    }

    #[test]
    fn reads_blob_with_millisecond_ids() {
        let blob = r#"[{"id":1736499600000,"title":"Call mum","description":"",
            "date":"2025-01-10","time":"09:00","completed":false,
            "createdAt":"2025-01-09T10:11:12.345Z"}]"#;
        let tasks = deserialize_tasks(blob);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, TaskId(1_736_499_600_000));
        assert_eq!(tasks[0].title, "Call mum");
    }

    #[test]
    fn save_then_load() {
        let store = MemoryBlobStore::new();
        let tasks = vec![task(7, "Persist me", "body", false)];
        save_tasks(&store, &tasks).unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(load_tasks(&store), tasks);
    }
}
