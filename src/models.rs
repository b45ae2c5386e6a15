use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique task identifier, serialized as a bare number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: String, // YYYY-MM-DD
    pub time: String, // HH:MM
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// The user-editable part of a task, used for both create and update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
}

impl TaskFields {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            date: date.into(),
            time: time.into(),
        }
    }

    /// Trim and check the fields, returning the normalized copy
    pub fn validate(&self) -> Result<TaskFields, ValidationError> {
        let title = self.title.trim();
        let date = self.date.trim();
        let time = self.time.trim();

        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if date.is_empty() {
            return Err(ValidationError::EmptyDate);
        }
        if time.is_empty() {
            return Err(ValidationError::EmptyTime);
        }
        if crate::utils::parse_date(date).is_err() {
            return Err(ValidationError::InvalidDate(date.to_string()));
        }
        if crate::utils::parse_time(time).is_err() {
            return Err(ValidationError::InvalidTime(time.to_string()));
        }

        Ok(TaskFields {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            date: date.to_string(),
            time: time.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,
    #[error("Date is required")]
    EmptyDate,
    #[error("Time is required")]
    EmptyTime,
    #[error("Date must be in YYYY-MM-DD format: {0}")]
    InvalidDate(String),
    #[error("Time must be in HH:MM format: {0}")]
    InvalidTime(String),
}

impl Task {
    /// Build a new incomplete task from already-validated fields
    pub fn new(id: TaskId, fields: TaskFields, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            date: fields.date,
            time: fields.time,
            completed: false,
            created_at,
        }
    }

    /// Overwrite the mutable fields; id, completion and creation time are kept
    pub fn apply(&mut self, fields: TaskFields) {
        self.title = fields.title;
        self.description = fields.description;
        self.date = fields.date;
        self.time = fields.time;
    }

    pub fn fields(&self) -> TaskFields {
        TaskFields {
            title: self.title.clone(),
            description: self.description.clone(),
            date: self.date.clone(),
            time: self.time.clone(),
        }
    }

    /// Date and time combined as local wall-clock time.
    /// Returns None when either part does not parse.
    pub fn due_instant(&self) -> Option<NaiveDateTime> {
        let date: NaiveDate = crate::utils::parse_date(self.date.trim()).ok()?;
        let time: NaiveTime = crate::utils::parse_time(self.time.trim()).ok()?;
        Some(date.and_time(time))
    }

    /// Due instant truncated to the minute
    pub fn due_minute(&self) -> Option<NaiveDateTime> {
        self.due_instant().map(crate::utils::truncate_to_minute)
    }

    /// Human readable due time, e.g. "Fri, Jan 10, 09:00 AM"
    pub fn due_label(&self) -> String {
        match self.due_instant() {
            Some(due) => due.format("%a, %b %-d, %I:%M %p").to_string(),
            None => format!("{} {}", self.date, self.time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Task {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        Task::new(
            TaskId(1),
            TaskFields::new("Write report", "", "2025-01-10", "09:00"),
            created,
        )
    }

    #[test]
    fn due_instant_combines_date_and_time() {
        let due = sample().due_instant().unwrap();
        assert_eq!(due.to_string(), "2025-01-10 09:00:00");
    }

    #[test]
    fn due_instant_is_none_for_garbage() {
        let mut task = sample();
        task.date = "tomorrow".to_string();
        assert!(task.due_instant().is_none());
        assert_eq!(task.due_label(), "tomorrow 09:00");
    }

    #[test]
    fn due_label_matches_short_format() {
        assert_eq!(sample().due_label(), "Fri, Jan 10, 09:00 AM");
    }

    #[test]
    fn validate_trims_and_rejects_blank_fields() {
        let fields = TaskFields::new("  Buy milk ", "  2 litres ", " 2025-03-01", "18:30 ");
        let clean = fields.validate().unwrap();
        assert_eq!(clean.title, "Buy milk");
        assert_eq!(clean.description, "2 litres");
        assert_eq!(clean.date, "2025-03-01");
        assert_eq!(clean.time, "18:30");

        assert_eq!(
            TaskFields::new("   ", "", "2025-03-01", "18:30").validate(),
            Err(ValidationError::EmptyTitle)
        );
        assert_eq!(
            TaskFields::new("x", "", " ", "18:30").validate(),
            Err(ValidationError::EmptyDate)
        );
        assert_eq!(
            TaskFields::new("x", "", "2025-03-01", "").validate(),
            Err(ValidationError::EmptyTime)
        );
        assert!(matches!(
            TaskFields::new("x", "", "2025-13-01", "10:00").validate(),
            Err(ValidationError::InvalidDate(_))
        ));
        assert!(matches!(
            TaskFields::new("x", "", "2025-01-01", "25:00").validate(),
            Err(ValidationError::InvalidTime(_))
        ));
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["completed", "createdAt", "date", "description", "id", "time", "title"]
        );
        assert_eq!(obj["id"], serde_json::json!(1));
    }
}
