use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::Frame;

use crate::config::Theme;
use crate::models::Task;
use crate::tui::app::DELETE_OPTIONS;
use crate::tui::widgets::popup::{option_lines, popup_area, render_popup};

pub fn render_confirm_delete(f: &mut Frame, area: Rect, task: &Task, selection: usize, theme: &Theme) {
    let mut lines = vec![
        Line::from("Are you sure you want to delete this task?"),
        Line::from(""),
        Line::from(task.title.clone()),
        Line::from(""),
    ];
    lines.extend(option_lines(&DELETE_OPTIONS, selection, theme));
    lines.push(Line::from(""));
    lines.push(Line::from("↑↓ to choose, Enter to confirm, Esc to cancel"));

    render_popup(f, popup_area(area, 50, 35), "Confirm Delete", lines, theme);
}
