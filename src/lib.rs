pub mod classify;
pub mod cli;
pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod persistence;
pub mod reminder;
pub mod sort;
pub mod store;
pub mod tui;
pub mod utils;

pub use classify::{classify, DueStatus};
pub use config::Config;
pub use database::Database;
pub use models::{Task, TaskFields, TaskId};
pub use persistence::{BlobStore, MemoryBlobStore};
pub use reminder::{ReminderPermission, ReminderScheduler};
pub use sort::SortCriterion;
pub use store::TaskStore;
pub use utils::Profile;
