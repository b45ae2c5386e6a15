use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, size as terminal_size, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::time::{Duration, Instant};

use crate::sort::SortCriterion;
use crate::tui::app::{App, Mode, TaskField, DELETE_OPTIONS, REMINDER_PROMPT_OPTIONS};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::widgets::form::description_viewport_height;
use crate::utils::{has_primary_modifier, local_now, parse_key_binding, ParsedKeyBinding};

/// Restores the terminal when dropped, including on panic.
/// Leaving raw mode or the alternate screen active makes the shell unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore explicitly on normal exit; drop is then a no-op
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check size before entering the alternate screen so the error is readable
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::TerminalTooSmall {
            width,
            height,
            min_width,
            min_height,
        });
    }

    let mut guard = TerminalGuard::new()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    app.start_reminders(Instant::now());
    let result = drive(&mut terminal, &mut app);
    app.shutdown();

    guard.restore()?;
    result
}

fn drive(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), TuiError> {
    loop {
        app.check_status_message_timeout();
        let fired = app.poll_reminders(Instant::now(), local_now());
        if fired > 0 {
            app.set_status_message(format!("{} task(s) due now", fired));
        }

        let size = terminal.size()?;
        let layout = Layout::calculate(Rect::new(0, 0, size.width, size.height));

        if app.ui.mode == Mode::Form {
            let viewport = description_viewport_height(layout.detail_area);
            if let Some(form) = app.form.as_mut() {
                let rows = match form.current_field {
                    TaskField::Description => viewport,
                    _ => 1,
                };
                form.current_editor_mut().update_scroll(rows);
            }
        }

        terminal.draw(|f| crate::tui::render::render(f, app, &layout))?;

        // Only process Press events to avoid duplicates on Windows
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(app, key_event)? {
                    return Ok(());
                }
            }
        }
    }
}

fn binding(spec: &str) -> Result<ParsedKeyBinding, TuiError> {
    parse_key_binding(spec).map_err(TuiError::KeyBinding)
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    if binding.requires_ctrl != has_primary_modifier(key_event.modifiers) {
        return false;
    }
    binding.key_code == key_event.code
}

/// Returns Ok(true) when the user asked to quit
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    // An alert popup swallows the next key
    if app.alerts.front().is_some() {
        app.dismiss_alert();
        return Ok(false);
    }

    match app.ui.mode {
        Mode::Help => handle_help_mode(app, key_event),
        Mode::ConfirmDelete => Ok(handle_delete_confirmation_modal(app, key_event)),
        Mode::ReminderPrompt => Ok(handle_reminder_prompt(app, key_event)),
        Mode::Form => handle_form_mode(app, key_event),
        Mode::View => handle_view_mode(app, key_event),
    }
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let help = binding(&app.config.key_bindings.help)?;
    if key_event.code == KeyCode::Esc || matches_key_event(key_event, &help) {
        app.exit_help_mode();
    }
    Ok(false)
}

fn cycle(selection: usize, len: usize, forward: bool) -> usize {
    if forward {
        (selection + 1) % len
    } else {
        (selection + len - 1) % len
    }
}

fn handle_delete_confirmation_modal(app: &mut App, key_event: KeyEvent) -> bool {
    let selection = &mut app.modals.delete_modal_selection;
    match key_event.code {
        KeyCode::Up | KeyCode::Left => *selection = cycle(*selection, DELETE_OPTIONS.len(), false),
        KeyCode::Down | KeyCode::Right | KeyCode::Tab => {
            *selection = cycle(*selection, DELETE_OPTIONS.len(), true)
        }
        KeyCode::Enter => {
            if *selection == 0 {
                app.confirm_delete();
            } else {
                app.cancel_delete();
            }
        }
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => app.cancel_delete(),
        _ => {}
    }
    false
}

fn handle_reminder_prompt(app: &mut App, key_event: KeyEvent) -> bool {
    let selection = &mut app.modals.reminder_prompt_selection;
    match key_event.code {
        KeyCode::Up => *selection = cycle(*selection, REMINDER_PROMPT_OPTIONS.len(), false),
        KeyCode::Down | KeyCode::Tab => {
            *selection = cycle(*selection, REMINDER_PROMPT_OPTIONS.len(), true)
        }
        KeyCode::Enter => app.choose_reminder_option(),
        KeyCode::Esc => app.skip_reminder_prompt(),
        _ => {}
    }
    false
}

fn handle_form_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let save = binding(&app.config.key_bindings.save)?;
    if matches_key_event(key_event, &save) {
        app.save_form();
        return Ok(false);
    }

    let Some(form) = app.form.as_mut() else {
        app.exit_form_mode();
        return Ok(false);
    };
    let primary = has_primary_modifier(key_event.modifiers);

    match key_event.code {
        KeyCode::Esc => app.exit_form_mode(),
        KeyCode::Tab => form.navigate(true),
        KeyCode::BackTab => form.navigate(false),
        KeyCode::Enter => match form.current_field {
            TaskField::Description => form.current_editor_mut().insert_newline(),
            TaskField::Time => app.save_form(),
            _ => form.navigate(true),
        },
        KeyCode::Backspace => form.current_editor_mut().delete_char(),
        KeyCode::Delete => form.current_editor_mut().delete_forward(),
        KeyCode::Left if primary => form.current_editor_mut().move_cursor_word_left(),
        KeyCode::Right if primary => form.current_editor_mut().move_cursor_word_right(),
        KeyCode::Left => form.current_editor_mut().move_cursor_left(),
        KeyCode::Right => form.current_editor_mut().move_cursor_right(),
        KeyCode::Up => form.current_editor_mut().move_cursor_up(),
        KeyCode::Down => form.current_editor_mut().move_cursor_down(),
        KeyCode::Home => form.current_editor_mut().move_cursor_home(),
        KeyCode::End => form.current_editor_mut().move_cursor_end(),
        KeyCode::Char('z') if primary => {
            form.current_editor_mut().undo();
        }
        KeyCode::Char(ch) if !primary && !key_event.modifiers.contains(KeyModifiers::ALT) => {
            form.current_editor_mut().insert_char(ch);
        }
        _ => {}
    }
    Ok(false)
}

fn handle_view_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let keys = app.config.key_bindings.clone();

    if matches_key_event(key_event, &binding(&keys.quit)?) {
        return Ok(true);
    }
    if matches_key_event(key_event, &binding(&keys.help)?) {
        app.enter_help_mode();
    } else if matches_key_event(key_event, &binding(&keys.new)?) {
        app.enter_create_mode();
    } else if matches_key_event(key_event, &binding(&keys.edit)?)
        || key_event.code == KeyCode::Enter
    {
        app.enter_edit_mode();
    } else if matches_key_event(key_event, &binding(&keys.delete)?) {
        app.request_delete();
    } else if matches_key_event(key_event, &binding(&keys.toggle_completed)?) {
        app.toggle_selected();
    } else if matches_key_event(key_event, &binding(&keys.sort_date)?) {
        app.sort_by(SortCriterion::Date);
    } else if matches_key_event(key_event, &binding(&keys.sort_title)?) {
        app.sort_by(SortCriterion::Title);
    } else if matches_key_event(key_event, &binding(&keys.toggle_theme)?) {
        app.toggle_theme();
    } else if matches_key_event(key_event, &binding(&keys.reminders)?) {
        app.open_reminder_prompt();
    } else if matches_key_event(key_event, &binding(&keys.list_up)?)
        || key_event.code == KeyCode::Up
    {
        app.move_selection_up();
    } else if matches_key_event(key_event, &binding(&keys.list_down)?)
        || key_event.code == KeyCode::Down
    {
        app.move_selection_down();
    } else if key_event.code == KeyCode::PageUp {
        app.scroll_item_view_up();
    } else if key_event.code == KeyCode::PageDown {
        app.scroll_item_view_down();
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::persistence::{BlobStore, MemoryBlobStore};
    use crate::reminder::ReminderPermission;
    use crate::store::TaskStore;

    fn app() -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.reminders.permission = ReminderPermission::Denied;
        config.reminders.sound = false;
        let backend: Box<dyn BlobStore> = Box::new(MemoryBlobStore::new());
        let app = App::new(config, dir.path().join("config.toml"), TaskStore::load(backend));
        (app, dir)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    #[test]
    fn quit_key_exits() {
        let (mut app, _dir) = app();
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn create_task_through_keys() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.ui.mode, Mode::Form);

        type_text(&mut app, "Water plants");
        press(&mut app, KeyCode::Enter); // to description
        type_text(&mut app, "balcony");
        press(&mut app, KeyCode::Tab); // to date, pre-filled
        press(&mut app, KeyCode::Enter); // to time
        type_text(&mut app, "18:30");
        press(&mut app, KeyCode::Enter); // save

        assert_eq!(app.ui.mode, Mode::View);
        let task = app.selected_task().unwrap();
        assert_eq!(task.title, "Water plants");
        assert_eq!(task.description, "balcony");
        assert_eq!(task.time, "18:30");
    }

    #[test]
    fn quit_key_types_inside_form() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Char('n'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.form.as_ref().unwrap().title.to_string(), "q");
    }

    #[test]
    fn ctrl_s_saves_form() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Call");
        app.form.as_mut().unwrap().time = crate::tui::widgets::editor::Editor::from_string("10:00");
        let ctrl_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        handle_key_event(&mut app, ctrl_s).unwrap();
        assert_eq!(app.store.len(), 1);
    }

    #[test]
    fn delete_flow_via_keys() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Temp");
        app.form.as_mut().unwrap().time = crate::tui::widgets::editor::Editor::from_string("10:00");
        app.save_form();

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.ui.mode, Mode::ConfirmDelete);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.store.len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Enter);
        assert!(app.store.is_empty());
    }

    #[test]
    fn alert_popup_swallows_key() {
        let (mut app, _dir) = app();
        app.grant_reminders();
        assert!(app.alerts.front().is_some());
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(app.alerts.is_empty());
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn prompt_selection_wraps() {
        assert_eq!(cycle(0, 3, false), 2);
        assert_eq!(cycle(2, 3, true), 0);
    }
}
