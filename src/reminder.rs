use std::collections::HashSet;
use std::io::Write;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Task, TaskId};
use crate::utils::truncate_to_minute;

/// Default time between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Body used when a due task has no description
pub const DEFAULT_ALERT_BODY: &str = "Your task is due now!";

/// Whether the user allowed reminders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderPermission {
    /// Not decided yet; the UI should ask
    #[default]
    Ask,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub task_id: Option<TaskId>,
    pub title: String,
    pub body: String,
}

impl Alert {
    pub fn for_task(task: &Task) -> Self {
        let body = if task.description.is_empty() {
            DEFAULT_ALERT_BODY.to_string()
        } else {
            task.description.clone()
        };
        Self {
            task_id: Some(task.id),
            title: format!("Task Due: {}", task.title),
            body,
        }
    }

    /// Confirmation shown once reminders are switched on
    pub fn reminders_enabled() -> Self {
        Self {
            task_id: None,
            title: "✓ Notifications Enabled".to_string(),
            body: "You will receive alerts for upcoming tasks".to_string(),
        }
    }
}

/// Receives alerts for display
pub trait AlertSink {
    fn alert(&mut self, alert: &Alert);
}

/// Collects alerts in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub alerts: Vec<Alert>,
}

impl AlertSink for RecordingSink {
    fn alert(&mut self, alert: &Alert) {
        self.alerts.push(alert.clone());
    }
}

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audible cue played alongside an alert. Failures are never surfaced.
pub trait SoundCue {
    fn play(&mut self) -> Result<(), SoundError>;
}

/// Rings the terminal bell
#[derive(Debug, Default)]
pub struct TerminalBell;

impl SoundCue for TerminalBell {
    fn play(&mut self) -> Result<(), SoundError> {
        let mut out = std::io::stdout();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NoSound;

impl SoundCue for NoSound {
    fn play(&mut self) -> Result<(), SoundError> {
        Ok(())
    }
}

/// Show an alert if reminders are enabled. A no-op otherwise.
pub fn emit_alert(enabled: bool, sink: &mut dyn AlertSink, alert: &Alert) {
    if enabled {
        sink.alert(alert);
    }
}

fn play_cue(sound: &mut dyn SoundCue) {
    if let Err(e) = sound.play() {
        debug!(error = %e, "alert sound failed");
    }
}

/// Recurring timer handle. Fires immediately once started, then once per
/// period. Periods that elapse without a poll are skipped, not queued.
#[derive(Debug, Clone)]
pub struct PollTimer {
    period: Duration,
    next_fire: Option<Instant>,
}

impl PollTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_secs(1)),
            next_fire: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arm the timer so the first poll at or after `now` fires
    pub fn start(&mut self, now: Instant) {
        self.next_fire = Some(now);
    }

    pub fn is_active(&self) -> bool {
        self.next_fire.is_some()
    }

    /// True when a period boundary has been reached; re-arms for `now + period`
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.next_fire {
            Some(next) if now >= next => {
                self.next_fire = Some(now + self.period);
                true
            }
            _ => false,
        }
    }

    /// Time left until the next fire, None when cancelled
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_fire.map(|next| next.saturating_duration_since(now))
    }

    /// Stop the timer. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if self.next_fire.take().is_some() {
            debug!("reminder poll timer cancelled");
        }
    }
}

/// Raises one alert per incomplete task whose due minute matches the
/// current minute. A minute that no poll lands in is never replayed.
pub struct ReminderScheduler {
    enabled: bool,
    timer: PollTimer,
    fired: HashSet<(TaskId, NaiveDateTime)>,
}

impl ReminderScheduler {
    pub fn new(permission: ReminderPermission, period: Duration) -> Self {
        Self {
            enabled: permission == ReminderPermission::Granted,
            timer: PollTimer::new(period),
            fired: HashSet::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn timer(&self) -> &PollTimer {
        &self.timer
    }

    /// Start polling; the first tick at or after `now` runs a check
    pub fn start(&mut self, now: Instant) {
        self.timer.start(now);
    }

    /// Tear down the poll timer
    pub fn shutdown(&mut self) {
        self.timer.cancel();
    }

    /// Alerts for tasks due in the same minute as `now`.
    /// Each task fires at most once for a given due minute.
    pub fn due_alerts(&mut self, tasks: &[Task], now: NaiveDateTime) -> Vec<Alert> {
        if !self.enabled {
            return Vec::new();
        }

        let now_minute = truncate_to_minute(now);
        // Only entries for the current minute can match again
        self.fired.retain(|(_, minute)| *minute == now_minute);

        tasks
            .iter()
            .filter(|task| !task.completed)
            .filter(|task| task.due_minute() == Some(now_minute))
            .filter(|task| self.fired.insert((task.id, now_minute)))
            .map(Alert::for_task)
            .collect()
    }

    /// Run one check now, emitting alerts and a cue for each. Returns the alert count.
    pub fn check_due_tasks(
        &mut self,
        tasks: &[Task],
        now: NaiveDateTime,
        sink: &mut dyn AlertSink,
        sound: &mut dyn SoundCue,
    ) -> usize {
        let alerts = self.due_alerts(tasks, now);
        for alert in &alerts {
            info!(title = %alert.title, "task due");
            sink.alert(alert);
            play_cue(sound);
        }
        alerts.len()
    }

    /// Called from the event loop as often as convenient; a check only runs
    /// when the poll timer fires.
    pub fn tick(
        &mut self,
        instant: Instant,
        now: NaiveDateTime,
        tasks: &[Task],
        sink: &mut dyn AlertSink,
        sound: &mut dyn SoundCue,
    ) -> usize {
        if !self.timer.fire_if_due(instant) {
            return 0;
        }
        self.check_due_tasks(tasks, now, sink, sound)
    }
}
