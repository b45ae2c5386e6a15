use chrono::NaiveDateTime;
use ratatui::widgets::ListState;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::Config;
use crate::models::{Task, TaskFields, TaskId};
use crate::reminder::{
    emit_alert, Alert, AlertSink, NoSound, ReminderPermission, ReminderScheduler, SoundCue,
    TerminalBell,
};
use crate::sort::SortCriterion;
use crate::store::{StoreError, TaskStore};
use crate::tui::widgets::editor::Editor;
use crate::utils::get_current_date_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Form,
    ConfirmDelete,
    ReminderPrompt,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Date,
    Time,
}

impl TaskField {
    fn next(self) -> Self {
        match self {
            TaskField::Title => TaskField::Description,
            TaskField::Description => TaskField::Date,
            TaskField::Date => TaskField::Time,
            TaskField::Time => TaskField::Title,
        }
    }

    fn previous(self) -> Self {
        match self {
            TaskField::Title => TaskField::Time,
            TaskField::Description => TaskField::Title,
            TaskField::Date => TaskField::Description,
            TaskField::Time => TaskField::Date,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    pub current_field: TaskField,
    pub title: Editor,
    pub description: Editor,
    pub date: Editor,
    pub time: Editor,
    pub editing_task_id: Option<TaskId>, // None for new tasks
}

impl TaskForm {
    /// Empty form with the date pre-filled to today
    pub fn new_for_today() -> Self {
        Self {
            current_field: TaskField::Title,
            title: Editor::new(),
            description: Editor::new(),
            date: Editor::from_string(&get_current_date_string()),
            time: Editor::new(),
            editing_task_id: None,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            current_field: TaskField::Title,
            title: Editor::from_string(&task.title),
            description: Editor::from_string(&task.description),
            date: Editor::from_string(&task.date),
            time: Editor::from_string(&task.time),
            editing_task_id: Some(task.id),
        }
    }

    pub fn fields(&self) -> TaskFields {
        TaskFields::new(
            self.title.to_string(),
            self.description.to_string(),
            self.date.to_string(),
            self.time.to_string(),
        )
    }

    pub fn current_editor_mut(&mut self) -> &mut Editor {
        match self.current_field {
            TaskField::Title => &mut self.title,
            TaskField::Description => &mut self.description,
            TaskField::Date => &mut self.date,
            TaskField::Time => &mut self.time,
        }
    }

    pub fn navigate(&mut self, forward: bool) {
        self.current_field = if forward {
            self.current_field.next()
        } else {
            self.current_field.previous()
        };
    }
}

/// Alerts waiting to be shown, oldest first
#[derive(Debug, Default)]
pub struct AlertQueue {
    pending: VecDeque<Alert>,
}

impl AlertQueue {
    pub fn front(&self) -> Option<&Alert> {
        self.pending.front()
    }

    pub fn dismiss(&mut self) -> Option<Alert> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl AlertSink for AlertQueue {
    fn alert(&mut self, alert: &Alert) {
        self.pending.push_back(alert.clone());
    }
}

/// Choices in the reminder prompt, in display order
pub const REMINDER_PROMPT_OPTIONS: [&str; 3] = ["Enable reminders", "Not now", "Never ask again"];

/// Choices in the delete confirmation, in display order
pub const DELETE_OPTIONS: [&str; 2] = ["Delete", "Cancel"];

#[derive(Debug, Clone)]
pub struct UiState {
    pub mode: Mode,
    pub selected_index: usize,
    pub list_state: ListState,
    pub item_view_scroll: usize,
    pub sort: SortCriterion,
}

#[derive(Debug, Clone, Default)]
pub struct ModalState {
    pub delete_confirmation: Option<TaskId>,
    pub delete_modal_selection: usize,
    pub reminder_prompt_selection: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

pub struct App {
    pub config: Config,
    pub config_path: PathBuf,
    pub store: TaskStore,
    pub scheduler: ReminderScheduler,
    pub alerts: AlertQueue,
    pub sound: Box<dyn SoundCue>,

    pub ui: UiState,
    pub form: Option<TaskForm>,
    pub modals: ModalState,
    pub status: StatusState,
}

impl App {
    pub fn new(config: Config, config_path: PathBuf, store: TaskStore) -> Self {
        let scheduler = ReminderScheduler::new(
            config.reminders.permission,
            config.reminders.poll_interval(),
        );
        let sound: Box<dyn SoundCue> = if config.reminders.sound {
            Box::new(TerminalBell)
        } else {
            Box::new(NoSound)
        };
        // Only ask when the user has not decided yet
        let mode = if config.reminders.permission == ReminderPermission::Ask {
            Mode::ReminderPrompt
        } else {
            Mode::View
        };

        let mut app = Self {
            config,
            config_path,
            store,
            scheduler,
            alerts: AlertQueue::default(),
            sound,
            ui: UiState {
                mode,
                selected_index: 0,
                list_state: ListState::default(),
                item_view_scroll: 0,
                sort: SortCriterion::Date,
            },
            form: None,
            modals: ModalState::default(),
            status: StatusState::default(),
        };
        app.sync_list_state();
        app
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.store.list().get(self.ui.selected_index)
    }

    pub fn sync_list_state(&mut self) {
        if self.store.is_empty() {
            self.ui.list_state.select(None);
        } else {
            self.ui.list_state.select(Some(self.ui.selected_index));
        }
    }

    /// Clamp the selection after the list shrank
    pub fn adjust_selected_index(&mut self) {
        let len = self.store.len();
        if self.ui.selected_index >= len {
            self.ui.selected_index = len.saturating_sub(1);
        }
        self.sync_list_state();
    }

    /// Move the selection onto the given task, if present
    pub fn select_task(&mut self, id: TaskId) {
        if let Some(index) = self.store.list().iter().position(|t| t.id == id) {
            self.ui.selected_index = index;
            self.ui.item_view_scroll = 0;
        }
        self.sync_list_state();
    }

    pub fn move_selection_up(&mut self) {
        if self.ui.selected_index > 0 {
            self.ui.selected_index -= 1;
            self.ui.item_view_scroll = 0;
            self.sync_list_state();
        }
    }

    pub fn move_selection_down(&mut self) {
        if self.ui.selected_index + 1 < self.store.len() {
            self.ui.selected_index += 1;
            self.ui.item_view_scroll = 0;
            self.sync_list_state();
        }
    }

    pub fn scroll_item_view_up(&mut self) {
        self.ui.item_view_scroll = self.ui.item_view_scroll.saturating_sub(1);
    }

    pub fn scroll_item_view_down(&mut self) {
        self.ui.item_view_scroll += 1;
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared (after 3 seconds)
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    fn report_store_error(&mut self, action: &str, err: StoreError) {
        match err {
            StoreError::Validation(e) => self.set_status_message(format!("{}", e)),
            e => {
                tracing::error!(error = %e, "failed to {}", action);
                self.set_status_message(format!("Failed to {}: {}", action, e));
            }
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    pub fn enter_create_mode(&mut self) {
        self.form = Some(TaskForm::new_for_today());
        self.ui.mode = Mode::Form;
    }

    pub fn enter_edit_mode(&mut self) {
        match self.selected_task() {
            Some(task) => {
                self.form = Some(TaskForm::from_task(task));
                self.ui.mode = Mode::Form;
            }
            None => self.set_status_message("No task selected".to_string()),
        }
    }

    pub fn exit_form_mode(&mut self) {
        self.form = None;
        self.ui.mode = Mode::View;
    }

    /// Validate and save the open form. Invalid input keeps the form open.
    pub fn save_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let fields = form.fields();
        let editing = form.editing_task_id;

        let result = match editing {
            Some(id) => self.store.update(id, fields).map(|t| t.map(|t| t.id)),
            None => self.store.create(fields).map(|t| Some(t.id)),
        };

        match result {
            Ok(Some(id)) => {
                self.exit_form_mode();
                self.select_task(id);
                let verb = if editing.is_some() { "updated" } else { "created" };
                self.set_status_message(format!("Task {}", verb));
            }
            Ok(None) => {
                self.exit_form_mode();
                self.set_status_message("Task not found".to_string());
            }
            Err(StoreError::Validation(e)) => {
                self.set_status_message(format!("{}", e));
            }
            Err(e) => {
                // The change is kept in memory; only the write failed
                self.exit_form_mode();
                self.report_store_error("save task", e);
            }
        }
    }

    /// Open the delete confirmation for the selected task
    pub fn request_delete(&mut self) {
        match self.selected_task().map(|t| t.id) {
            Some(id) => {
                self.modals.delete_confirmation = Some(id);
                self.modals.delete_modal_selection = 0;
                self.ui.mode = Mode::ConfirmDelete;
            }
            None => self.set_status_message("No task selected".to_string()),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.modals.delete_confirmation = None;
        self.ui.mode = Mode::View;
    }

    pub fn confirm_delete(&mut self) {
        let Some(id) = self.modals.delete_confirmation.take() else {
            self.ui.mode = Mode::View;
            return;
        };
        self.ui.mode = Mode::View;
        match self.store.remove(id) {
            Ok(Some(_)) => self.set_status_message("Task deleted".to_string()),
            Ok(None) => self.set_status_message("Task not found".to_string()),
            Err(e) => self.report_store_error("delete task", e),
        }
        self.adjust_selected_index();
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id) else {
            return;
        };
        match self.store.toggle_completion(id) {
            Ok(Some(true)) => self.set_status_message("Task completed".to_string()),
            Ok(Some(false)) => self.set_status_message("Task marked incomplete".to_string()),
            Ok(None) => {}
            Err(e) => self.report_store_error("update task", e),
        }
    }

    /// Re-sort the list, keeping the same task selected
    pub fn sort_by(&mut self, criterion: SortCriterion) {
        let selected = self.selected_task().map(|t| t.id);
        self.store.sort_by(criterion);
        self.ui.sort = criterion;
        if let Some(id) = selected {
            self.select_task(id);
        }
        self.set_status_message(format!("Sorted by {}", criterion));
    }

    fn save_config(&mut self) {
        if let Err(e) = self.config.save_to_path(&self.config_path) {
            tracing::warn!(error = %e, "failed to save config");
            self.set_status_message(format!("Failed to save settings: {}", e));
        }
    }

    pub fn toggle_theme(&mut self) {
        self.config.theme = self.config.theme.toggled();
        self.save_config();
    }

    pub fn open_reminder_prompt(&mut self) {
        self.modals.reminder_prompt_selection = 0;
        self.ui.mode = Mode::ReminderPrompt;
    }

    /// Apply the highlighted reminder prompt choice
    pub fn choose_reminder_option(&mut self) {
        match self.modals.reminder_prompt_selection {
            0 => self.grant_reminders(),
            1 => self.skip_reminder_prompt(),
            _ => self.deny_reminders(),
        }
    }

    pub fn grant_reminders(&mut self) {
        self.config.reminders.permission = ReminderPermission::Granted;
        self.scheduler.set_enabled(true);
        self.ui.mode = Mode::View;
        self.save_config();
        emit_alert(
            self.scheduler.is_enabled(),
            &mut self.alerts,
            &Alert::reminders_enabled(),
        );
    }

    /// Hide the prompt for this session only
    pub fn skip_reminder_prompt(&mut self) {
        self.ui.mode = Mode::View;
    }

    pub fn deny_reminders(&mut self) {
        self.config.reminders.permission = ReminderPermission::Denied;
        self.scheduler.set_enabled(false);
        self.ui.mode = Mode::View;
        self.save_config();
        self.set_status_message("Reminders turned off".to_string());
    }

    pub fn start_reminders(&mut self, now: Instant) {
        self.scheduler.start(now);
    }

    /// Run the reminder tick; returns how many alerts were raised
    pub fn poll_reminders(&mut self, instant: Instant, now: NaiveDateTime) -> usize {
        let Self {
            scheduler,
            store,
            alerts,
            sound,
            ..
        } = self;
        scheduler.tick(instant, now, store.list(), alerts, sound.as_mut())
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.dismiss();
    }

    /// Cancel the poll timer before leaving the UI
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{BlobStore, MemoryBlobStore};
    use std::time::Duration;

    fn app_with(permission: ReminderPermission) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.reminders.permission = permission;
        config.reminders.sound = false;
        let backend: Box<dyn BlobStore> = Box::new(MemoryBlobStore::new());
        let app = App::new(config, dir.path().join("config.toml"), TaskStore::load(backend));
        (app, dir)
    }

    fn fill(form: &mut TaskForm, title: &str, date: &str, time: &str) {
        form.title = Editor::from_string(title);
        form.date = Editor::from_string(date);
        form.time = Editor::from_string(time);
    }

    fn add(app: &mut App, title: &str, date: &str, time: &str) {
        app.enter_create_mode();
        fill(app.form.as_mut().unwrap(), title, date, time);
        app.save_form();
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn undecided_permission_opens_prompt() {
        let (app, _dir) = app_with(ReminderPermission::Ask);
        assert_eq!(app.ui.mode, Mode::ReminderPrompt);
        let (app, _dir) = app_with(ReminderPermission::Denied);
        assert_eq!(app.ui.mode, Mode::View);
    }

    #[test]
    fn create_form_prefills_today() {
        let (mut app, _dir) = app_with(ReminderPermission::Denied);
        app.enter_create_mode();
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.date.to_string(), get_current_date_string());
        assert!(form.title.to_string().is_empty());
    }

    #[test]
    fn invalid_form_stays_open() {
        let (mut app, _dir) = app_with(ReminderPermission::Denied);
        add(&mut app, "  ", "2025-01-10", "09:00");
        assert_eq!(app.ui.mode, Mode::Form);
        assert!(app.store.is_empty());
        assert!(app.status.message.is_some());
    }

    #[test]
    fn saving_selects_new_task() {
        let (mut app, _dir) = app_with(ReminderPermission::Denied);
        add(&mut app, "Later", "2025-03-01", "09:00");
        add(&mut app, "Sooner", "2025-01-01", "09:00");
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.selected_task().unwrap().title, "Sooner");
        assert_eq!(app.status.message.as_deref(), Some("Task created"));
    }

    #[test]
    fn edit_keeps_identity() {
        let (mut app, _dir) = app_with(ReminderPermission::Denied);
        add(&mut app, "Draft", "2025-01-01", "09:00");
        let id = app.selected_task().unwrap().id;

        app.enter_edit_mode();
        app.form.as_mut().unwrap().title = Editor::from_string("Final");
        app.save_form();

        assert_eq!(app.store.len(), 1);
        let task = app.selected_task().unwrap();
        assert_eq!((task.id, task.title.as_str()), (id, "Final"));
    }

    #[test]
    fn delete_needs_confirmation() {
        let (mut app, _dir) = app_with(ReminderPermission::Denied);
        add(&mut app, "Keep", "2025-01-01", "09:00");

        app.request_delete();
        assert_eq!(app.ui.mode, Mode::ConfirmDelete);
        app.cancel_delete();
        assert_eq!(app.store.len(), 1);

        app.request_delete();
        app.confirm_delete();
        assert!(app.store.is_empty());
        assert_eq!(app.ui.list_state.selected(), None);
    }

    #[test]
    fn sort_keeps_selection_on_same_task() {
        let (mut app, _dir) = app_with(ReminderPermission::Denied);
        add(&mut app, "banana", "2025-01-01", "09:00");
        add(&mut app, "apple", "2025-02-01", "09:00");
        assert_eq!(app.selected_task().unwrap().title, "apple");

        app.sort_by(SortCriterion::Title);
        assert_eq!(app.ui.selected_index, 0);
        assert_eq!(app.selected_task().unwrap().title, "apple");
        assert_eq!(app.store.list()[1].title, "banana");
    }

    #[test]
    fn granting_persists_and_confirms() {
        let (mut app, dir) = app_with(ReminderPermission::Ask);
        app.choose_reminder_option();

        assert!(app.scheduler.is_enabled());
        assert_eq!(app.alerts.front().unwrap().title, "✓ Notifications Enabled");
        let saved = Config::load_from_path(&dir.path().join("config.toml")).unwrap();
        assert_eq!(saved.reminders.permission, ReminderPermission::Granted);
    }

    #[test]
    fn skipping_does_not_persist() {
        let (mut app, dir) = app_with(ReminderPermission::Ask);
        app.modals.reminder_prompt_selection = 1;
        app.choose_reminder_option();
        assert_eq!(app.ui.mode, Mode::View);
        assert!(!dir.path().join("config.toml").exists());
    }

    #[test]
    fn never_ask_again_persists_denial() {
        let (mut app, dir) = app_with(ReminderPermission::Ask);
        app.modals.reminder_prompt_selection = 2;
        app.choose_reminder_option();

        assert!(!app.scheduler.is_enabled());
        assert!(app.alerts.is_empty());
        let saved = Config::load_from_path(&dir.path().join("config.toml")).unwrap();
        assert_eq!(saved.reminders.permission, ReminderPermission::Denied);
    }

    #[test]
    fn due_task_raises_alert_once() {
        let (mut app, _dir) = app_with(ReminderPermission::Granted);
        add(&mut app, "Standup", "2025-01-10", "09:00");

        let start = Instant::now();
        app.start_reminders(start);
        assert_eq!(app.poll_reminders(start, at("2025-01-10 09:00")), 1);
        assert_eq!(app.alerts.front().unwrap().title, "Task Due: Standup");

        let next = start + Duration::from_secs(60);
        assert_eq!(app.poll_reminders(next, at("2025-01-10 09:00")), 0);

        app.dismiss_alert();
        assert!(app.alerts.is_empty());

        app.shutdown();
        assert!(!app.scheduler.timer().is_active());
    }
}
