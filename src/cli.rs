use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::classify::{classify, due_label_with_badge, DueStatus};
use crate::config::{Config, ConfigError};
use crate::models::{Task, TaskFields, TaskId};
use crate::reminder::{
    emit_alert, Alert, AlertSink, NoSound, ReminderPermission, ReminderScheduler, SoundCue,
    TerminalBell,
};
use crate::sort::SortCriterion;
use crate::store::{StoreError, TaskStore};
use crate::utils::{get_current_date_string, local_now};

#[derive(Parser)]
#[command(name = "dueline")]
#[command(about = "A terminal task list with due-time reminders")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long, global = true)]
    pub dev: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Keep tasks in memory only; nothing is written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Add a new task
    Add {
        /// Task title
        title: String,
        /// Due date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Due time (HH:MM)
        #[arg(long)]
        time: String,
        /// Free-form description
        #[arg(long)]
        description: Option<String>,
    },
    /// List tasks with their due status
    List {
        /// Order to print tasks in
        #[arg(long, value_enum, default_value_t = SortCriterion::Date)]
        sort: SortCriterion,
    },
    /// Change fields of an existing task
    Edit {
        /// Task id, as printed by `list`
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
    },
    /// Flip a task between completed and incomplete
    Toggle {
        /// Task id
        id: i64,
    },
    /// Delete a task
    Delete {
        /// Task id
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Run one reminder check now
    Check {
        /// Check even if reminders are not enabled
        #[arg(long)]
        force: bool,
    },
    /// Keep polling for due tasks and print alerts as they fire
    Watch,
    /// Allow due-time alerts
    EnableReminders,
    /// Turn off due-time alerts
    DisableReminders,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("No task with id {0}")]
    TaskNotFound(TaskId),
}

/// Prints alerts to stdout
#[derive(Debug, Default)]
pub struct StdoutSink;

impl AlertSink for StdoutSink {
    fn alert(&mut self, alert: &Alert) {
        println!("{}", format_alert(alert));
    }
}

pub fn format_alert(alert: &Alert) -> String {
    format!("🔔 {} - {}", alert.title, alert.body)
}

/// One line per task: id, checkbox, title, due label with badge
pub fn format_task_line(task: &Task, now: chrono::NaiveDateTime) -> String {
    let marker = if task.completed { "[x]" } else { "[ ]" };
    format!(
        "{:>14}  {} {}  {}",
        task.id,
        marker,
        task.title,
        due_label_with_badge(task, now)
    )
}

fn sound_for(config: &Config) -> Box<dyn SoundCue> {
    if config.reminders.sound {
        Box::new(TerminalBell)
    } else {
        Box::new(NoSound)
    }
}

/// Handle the add command
pub fn handle_add(
    title: String,
    date: Option<String>,
    time: String,
    description: Option<String>,
    store: &mut TaskStore,
) -> Result<(), CliError> {
    let date = date.unwrap_or_else(get_current_date_string);
    let fields = TaskFields::new(title, description.unwrap_or_default(), date, time);
    let task = store.create(fields)?;
    println!("Task created successfully (ID: {})", task.id);
    Ok(())
}

/// Handle the list command
pub fn handle_list(sort: SortCriterion, store: &mut TaskStore) -> Result<(), CliError> {
    store.sort_by(sort);
    if store.is_empty() {
        println!("No tasks yet. Add one with `dueline add`.");
        return Ok(());
    }

    let now = local_now();
    for task in store.list() {
        println!("{}", format_task_line(task, now));
        if !task.description.is_empty() {
            println!("{:>14}      {}", "", task.description);
        }
    }

    let overdue = store
        .list()
        .iter()
        .filter(|t| classify(t, now) == DueStatus::Overdue)
        .count();
    if overdue > 0 {
        println!("\n{} overdue", overdue);
    }
    Ok(())
}

/// Handle the edit command. Fields not given keep their current value.
pub fn handle_edit(
    id: TaskId,
    title: Option<String>,
    description: Option<String>,
    date: Option<String>,
    time: Option<String>,
    store: &mut TaskStore,
) -> Result<(), CliError> {
    let current = store.get(id).ok_or(CliError::TaskNotFound(id))?.fields();
    let fields = TaskFields {
        title: title.unwrap_or(current.title),
        description: description.unwrap_or(current.description),
        date: date.unwrap_or(current.date),
        time: time.unwrap_or(current.time),
    };
    store.update(id, fields)?.ok_or(CliError::TaskNotFound(id))?;
    println!("Task {} updated", id);
    Ok(())
}

/// Handle the toggle command
pub fn handle_toggle(id: TaskId, store: &mut TaskStore) -> Result<(), CliError> {
    let completed = store
        .toggle_completion(id)?
        .ok_or(CliError::TaskNotFound(id))?;
    let state = if completed { "completed" } else { "not completed" };
    println!("Task {} marked {}", id, state);
    Ok(())
}

/// Handle the delete command
pub fn handle_delete(id: TaskId, yes: bool, store: &mut TaskStore) -> Result<(), CliError> {
    let task = store.get(id).ok_or(CliError::TaskNotFound(id))?;
    if !yes {
        let prompt = format!("Are you sure you want to delete \"{}\"? [y/N] ", task.title);
        let stdin = io::stdin();
        if !confirm(&prompt, &mut stdin.lock(), &mut io::stdout())? {
            println!("Cancelled");
            return Ok(());
        }
    }
    store.remove(id)?;
    println!("Task {} deleted", id);
    Ok(())
}

/// Ask a yes/no question. Anything but "y" or "yes" means no.
pub fn confirm(prompt: &str, input: &mut dyn BufRead, output: &mut dyn Write) -> io::Result<bool> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Handle the check command
pub fn handle_check(force: bool, store: &TaskStore, config: &Config) -> Result<(), CliError> {
    let permission = if force {
        ReminderPermission::Granted
    } else {
        config.reminders.permission
    };
    if permission != ReminderPermission::Granted {
        println!("Reminders are not enabled. Run `dueline enable-reminders` or pass --force.");
        return Ok(());
    }

    let mut scheduler = ReminderScheduler::new(permission, config.reminders.poll_interval());
    let mut sound = sound_for(config);
    let fired = scheduler.check_due_tasks(store.list(), local_now(), &mut StdoutSink, sound.as_mut());
    if fired == 0 {
        println!("Nothing due right now");
    }
    Ok(())
}

/// Handle the watch command. Runs until interrupted.
pub fn handle_watch(store: &mut TaskStore, config: &Config) -> Result<(), CliError> {
    if !config.reminders.is_enabled() {
        println!("Reminders are not enabled. Run `dueline enable-reminders` first.");
        return Ok(());
    }

    let mut scheduler = ReminderScheduler::new(config.reminders.permission, config.reminders.poll_interval());
    let mut sound = sound_for(config);
    let mut sink = StdoutSink;
    println!(
        "Watching for due tasks every {}s (Ctrl+C to stop)",
        scheduler.timer().period().as_secs()
    );

    scheduler.start(Instant::now());
    loop {
        let now = Instant::now();
        if scheduler.timer().time_until_next(now) == Some(Duration::ZERO) {
            // Pick up tasks added from other invocations
            store.reload();
        }
        scheduler.tick(now, local_now(), store.list(), &mut sink, sound.as_mut());
        let wait = scheduler
            .timer()
            .time_until_next(Instant::now())
            .unwrap_or(Duration::from_secs(1));
        std::thread::sleep(wait.max(Duration::from_millis(100)));
    }
}

/// Handle enable-reminders / disable-reminders
pub fn handle_set_reminders(
    enabled: bool,
    config: &mut Config,
    config_path: &Path,
) -> Result<(), CliError> {
    config.reminders.permission = if enabled {
        ReminderPermission::Granted
    } else {
        ReminderPermission::Denied
    };
    config.save_to_path(config_path)?;

    if enabled {
        emit_alert(true, &mut StdoutSink, &Alert::reminders_enabled());
    } else {
        println!("Reminders disabled");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, Utc};
    use std::io::Cursor;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn confirm_accepts_only_yes() {
        for (answer, expected) in [("y\n", true), ("YES\n", true), ("n\n", false), ("\n", false), ("", false)] {
            let mut out = Vec::new();
            let result = confirm("Delete? ", &mut Cursor::new(answer), &mut out).unwrap();
            assert_eq!(result, expected, "answer {:?}", answer);
            assert_eq!(String::from_utf8(out).unwrap(), "Delete? ");
        }
    }

    #[test]
    fn task_line_shows_marker_and_badge() {
        let mut task = Task::new(
            TaskId(1736500000000),
            TaskFields::new("Pay rent", "", "2025-01-09", "08:00"),
            Utc::now(),
        );
        let line = format_task_line(&task, at("2025-01-10 09:00"));
        assert!(line.contains("[ ] Pay rent"));
        assert!(line.ends_with("(OVERDUE)"));
        assert!(line.trim_start().starts_with("1736500000000"));

        task.completed = true;
        let line = format_task_line(&task, at("2025-01-10 09:00"));
        assert!(line.contains("[x] Pay rent"));
        assert!(!line.contains("OVERDUE"));
    }

    #[test]
    fn alert_line_has_title_and_body() {
        assert_eq!(
            format_alert(&Alert::reminders_enabled()),
            "🔔 ✓ Notifications Enabled - You will receive alerts for upcoming tasks"
        );
    }

    #[test]
    fn cli_parses_add_with_defaults() {
        let cli = Cli::try_parse_from(["dueline", "add", "Buy milk", "--time", "17:00"]).unwrap();
        match cli.command {
            Some(Commands::Add { title, date, time, description }) => {
                assert_eq!(title, "Buy milk");
                assert_eq!(date, None);
                assert_eq!(time, "17:00");
                assert_eq!(description, None);
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["dueline", "list", "--sort", "title", "--ephemeral"]).unwrap();
        assert!(cli.ephemeral);
        assert!(matches!(cli.command, Some(Commands::List { sort: SortCriterion::Title })));
    }
}
