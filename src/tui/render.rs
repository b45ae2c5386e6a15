use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::tui::app::{Mode, REMINDER_PROMPT_OPTIONS};
use crate::tui::widgets::{
    color::parse_color,
    confirm_delete::render_confirm_delete,
    form::render_task_form,
    help::render_help,
    item_view::render_item_view,
    popup::{render_alert, render_reminder_prompt},
    status_bar::render_status_bar,
    task_list::render_task_list,
};
use crate::tui::{App, Layout};
use crate::utils::{format_key_binding_for_display as key, local_now};

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let theme = app.config.get_active_theme();
    let now = local_now();

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Dueline")
        .title_alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(parse_color(&theme.fg))
                .bg(parse_color(&theme.bg)),
        );
    f.render_widget(outer_block, f.area());

    render_task_list(
        f,
        layout.list_area,
        app.store.list(),
        now,
        &mut app.ui.list_state,
        app.ui.sort,
        &theme,
    );

    match (&app.ui.mode, &app.form) {
        (Mode::Form, Some(form)) => render_task_form(f, layout.detail_area, form, &theme),
        _ => render_item_view(
            f,
            layout.detail_area,
            app.selected_task(),
            now,
            &theme,
            app.ui.item_view_scroll,
        ),
    }

    // Overlays after the normal content
    match app.ui.mode {
        Mode::Help => render_help(f, f.area(), &app.config),
        Mode::ConfirmDelete => {
            if let Some(task) = app.modals.delete_confirmation.and_then(|id| app.store.get(id)) {
                render_confirm_delete(f, f.area(), task, app.modals.delete_modal_selection, &theme);
            }
        }
        Mode::ReminderPrompt => render_reminder_prompt(
            f,
            f.area(),
            &REMINDER_PROMPT_OPTIONS,
            app.modals.reminder_prompt_selection,
            &theme,
        ),
        Mode::View | Mode::Form => {}
    }

    // Alerts sit above everything else
    if let Some(alert) = app.alerts.front() {
        render_alert(f, f.area(), alert, app.alerts.len(), &theme);
    }

    let key_hints = get_key_hints(app);
    render_status_bar(
        f,
        layout.status_area,
        app.status.message.as_deref(),
        &key_hints,
        &theme,
    );
}

fn get_key_hints(app: &App) -> Vec<String> {
    let keys = &app.config.key_bindings;
    if !app.alerts.is_empty() {
        return vec!["Any key: Dismiss reminder".to_string()];
    }
    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Exit help", key(&keys.help))],
        Mode::ConfirmDelete => vec![
            "Enter: Confirm".to_string(),
            "y/n: Delete/Cancel".to_string(),
            "Esc: Cancel".to_string(),
        ],
        Mode::ReminderPrompt => vec![
            "↑/↓: Choose".to_string(),
            "Enter: Confirm".to_string(),
            "Esc: Not now".to_string(),
        ],
        Mode::Form => vec![
            "Tab/Enter: Next field".to_string(),
            "Shift+Tab: Previous field".to_string(),
            format!("{}: Save", key(&keys.save)),
            "Esc: Cancel".to_string(),
        ],
        Mode::View => {
            let reminders = if app.scheduler.is_enabled() { "on" } else { "off" };
            vec![
                format!("{}: Quit", key(&keys.quit)),
                format!("{}: New", key(&keys.new)),
                format!("{}: Edit", key(&keys.edit)),
                format!("{}: Done", key(&keys.toggle_completed)),
                format!("{}: Delete", key(&keys.delete)),
                format!("{}/{}: Sort date/title", key(&keys.sort_date), key(&keys.sort_title)),
                format!("{}: Theme", key(&keys.toggle_theme)),
                format!("{}: Reminders ({})", key(&keys.reminders), reminders),
                format!("{}: Help", key(&keys.help)),
            ]
        }
    }
}
