use chrono::{NaiveDateTime, TimeDelta};

use crate::models::Task;

/// Hours before the due instant during which a task is flagged as due soon
pub const DUE_SOON_HOURS: i64 = 24;

/// Temporal status of a task relative to a reference instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DueStatus {
    Normal,
    DueSoon,
    Overdue,
}

impl DueStatus {
    /// Suffix shown after the due label, empty for normal tasks
    pub fn badge(self) -> &'static str {
        match self {
            DueStatus::Normal => "",
            DueStatus::DueSoon => " (DUE SOON)",
            DueStatus::Overdue => " (OVERDUE)",
        }
    }
}

/// Classify a task against `now`.
///
/// Completed tasks are always [`DueStatus::Normal`]. A task whose date or
/// time cannot be parsed is also treated as normal.
pub fn classify(task: &Task, now: NaiveDateTime) -> DueStatus {
    if task.completed {
        return DueStatus::Normal;
    }
    match task.due_instant() {
        Some(due) => classify_delta(due - now),
        None => DueStatus::Normal,
    }
}

fn classify_delta(delta: TimeDelta) -> DueStatus {
    if delta < TimeDelta::zero() {
        DueStatus::Overdue
    } else if delta <= TimeDelta::hours(DUE_SOON_HOURS) {
        DueStatus::DueSoon
    } else {
        DueStatus::Normal
    }
}

/// Due label with the status badge appended
pub fn due_label_with_badge(task: &Task, now: NaiveDateTime) -> String {
    format!("{}{}", task.due_label(), classify(task, now).badge())
}
