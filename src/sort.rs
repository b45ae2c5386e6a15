use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::preferences::CollationCaseFirst;
use icu_collator::{Collator, CollatorBorrowed, CollatorPreferences};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortCriterion {
    /// Ascending by due date and time
    #[default]
    Date,
    /// Ascending by title, locale-aware
    Title,
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortCriterion::Date => write!(f, "date"),
            SortCriterion::Title => write!(f, "title"),
        }
    }
}

impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(SortCriterion::Date),
            "title" => Ok(SortCriterion::Title),
            other => Err(format!("Unknown sort criterion: {}", other)),
        }
    }
}

/// Sort tasks in place. Stable for both criteria, so tasks with equal keys
/// keep their current relative position.
pub fn sort_tasks(tasks: &mut [Task], criterion: SortCriterion) {
    match criterion {
        // Tasks without a parseable due instant go last
        SortCriterion::Date => tasks.sort_by_key(|task| {
            let due = task.due_instant();
            (due.is_none(), due)
        }),
        SortCriterion::Title => match title_collator() {
            Some(collator) => tasks.sort_by(|a, b| collator.compare(&a.title, &b.title)),
            None => tasks.sort_by(|a, b| a.title.cmp(&b.title)),
        },
    }
}

/// Root-locale collator: letters first regardless of case or accents, then
/// accents, then case with lowercase first
fn title_collator() -> Option<CollatorBorrowed<'static>> {
    let mut prefs = CollatorPreferences::default();
    prefs.case_first = Some(CollationCaseFirst::Lower);
    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Tertiary);
    match Collator::try_new(prefs, options) {
        Ok(collator) => Some(collator),
        Err(e) => {
            warn!(error = %e, "collation data unavailable, comparing titles by code point");
            None
        }
    }
}

/// Compare two titles the way the title sort orders them
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    match title_collator() {
        Some(collator) => collator.compare(a, b),
        None => a.cmp(b),
    }
}
