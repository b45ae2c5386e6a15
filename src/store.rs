use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Task, TaskFields, TaskId, ValidationError};
use crate::persistence::{self, BlobStore, StorageError};
use crate::sort::{SortCriterion, sort_tasks};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("No free task id left")]
    IdsExhausted,
}

/// Hands out ids that are unique and strictly increasing for the session.
/// Ids are millisecond timestamps, bumped when two are requested in the
/// same millisecond or when the clock is behind an already issued id.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last_issued: i64,
}

impl IdGenerator {
    /// Seed from the ids already present in a loaded collection
    pub fn seeded_from(tasks: &[Task]) -> Self {
        Self {
            last_issued: tasks.iter().map(|t| t.id.0).max().unwrap_or(0),
        }
    }

    /// Next id not used by any of `taken`. Once the newest id is `i64::MAX`
    /// the lowest free positive id is handed out instead.
    pub fn next_id(&mut self, now: DateTime<Utc>, taken: &[Task]) -> Option<TaskId> {
        if let Some(floor) = self.last_issued.checked_add(1) {
            let candidate = now.timestamp_millis().max(floor);
            self.last_issued = candidate;
            return Some(TaskId(candidate));
        }
        let used: HashSet<i64> = taken.iter().map(|t| t.id.0).collect();
        (1..i64::MAX).find(|id| !used.contains(id)).map(TaskId)
    }
}

/// Give every task after the first holder of an id a fresh one
fn reissue_duplicate_ids(tasks: &mut [Task], ids: &mut IdGenerator) {
    let mut seen = HashSet::new();
    for index in 0..tasks.len() {
        let id = tasks[index].id;
        if seen.insert(id) {
            continue;
        }
        if let Some(fresh) = ids.next_id(Utc::now(), tasks) {
            warn!(%id, %fresh, title = %tasks[index].title, "duplicate task id in stored list, re-issued");
            tasks[index].id = fresh;
            seen.insert(fresh);
        }
    }
}

pub struct TaskStore<B: BlobStore = Box<dyn BlobStore>> {
    tasks: Vec<Task>,
    backend: B,
    ids: IdGenerator,
}

impl<B: BlobStore> TaskStore<B> {
    /// Load the stored collection, sorted by due date
    pub fn load(backend: B) -> Self {
        let mut tasks = persistence::load_tasks(&backend);
        let mut ids = IdGenerator::seeded_from(&tasks);
        reissue_duplicate_ids(&mut tasks, &mut ids);
        sort_tasks(&mut tasks, SortCriterion::Date);
        Self {
            tasks,
            backend,
            ids,
        }
    }

    /// Re-read the stored collection, discarding in-memory order
    pub fn reload(&mut self) {
        let mut tasks = persistence::load_tasks(&self.backend);
        let seeded = IdGenerator::seeded_from(&tasks);
        if seeded.last_issued > self.ids.last_issued {
            self.ids = seeded;
        }
        reissue_duplicate_ids(&mut tasks, &mut self.ids);
        sort_tasks(&mut tasks, SortCriterion::Date);
        self.tasks = tasks;
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Tasks in their last-sorted order
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Validate and append a new task
    pub fn create(&mut self, fields: TaskFields) -> Result<Task, StoreError> {
        self.create_at(fields, Utc::now())
    }

    /// Same as [`TaskStore::create`] with an explicit creation timestamp
    pub fn create_at(
        &mut self,
        fields: TaskFields,
        created_at: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        let fields = fields.validate()?;
        let id = self
            .ids
            .next_id(created_at, &self.tasks)
            .ok_or(StoreError::IdsExhausted)?;
        let task = Task::new(id, fields, created_at);
        self.tasks.push(task.clone());
        debug!(id = %task.id, "created task");
        self.persist()?;
        Ok(task)
    }

    /// Overwrite the editable fields of a task.
    /// Returns `Ok(None)` without persisting when the id is unknown.
    pub fn update(&mut self, id: TaskId, fields: TaskFields) -> Result<Option<Task>, StoreError> {
        let fields = fields.validate()?;
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(%id, "update skipped, task not found");
            return Ok(None);
        };
        task.apply(fields);
        let updated = task.clone();
        debug!(%id, "updated task");
        self.persist()?;
        Ok(Some(updated))
    }

    /// Delete a task. Confirmation is the caller's job.
    /// Returns the removed task, or `None` when the id is unknown.
    pub fn remove(&mut self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            debug!(%id, "remove skipped, task not found");
            return Ok(None);
        };
        let removed = self.tasks.remove(index);
        debug!(%id, "removed task");
        self.persist()?;
        Ok(Some(removed))
    }

    /// Flip the completed flag. Returns the new value, or `None` when the id is unknown.
    pub fn toggle_completion(&mut self, id: TaskId) -> Result<Option<bool>, StoreError> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(%id, "toggle skipped, task not found");
            return Ok(None);
        };
        task.completed = !task.completed;
        let completed = task.completed;
        debug!(%id, completed, "toggled task");
        self.persist()?;
        Ok(Some(completed))
    }

    /// Reorder the collection. This is the only operation that changes order.
    pub fn sort_by(&mut self, criterion: SortCriterion) {
        sort_tasks(&mut self.tasks, criterion);
    }

    fn persist(&self) -> Result<(), StorageError> {
        persistence::save_tasks(&self.backend, &self.tasks)
    }
}
