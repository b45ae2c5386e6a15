use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::config::Theme;
use crate::tui::app::{TaskField, TaskForm};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::editor::Editor;

/// Height of a bordered single-line field
const SINGLE_LINE_HEIGHT: u16 = 3;

/// Split the form area into title, description, date and time fields
pub fn form_field_areas(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(SINGLE_LINE_HEIGHT),
            Constraint::Min(SINGLE_LINE_HEIGHT),
            Constraint::Length(SINGLE_LINE_HEIGHT),
            Constraint::Length(SINGLE_LINE_HEIGHT),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

/// Rows available to the description editor when the form fills `area`
pub fn description_viewport_height(area: Rect) -> usize {
    form_field_areas(inner(area))[1].height.saturating_sub(2) as usize
}

fn inner(area: Rect) -> Rect {
    Rect::new(
        area.x + 1,
        area.y + 1,
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    )
}

fn render_field(
    f: &mut Frame,
    area: Rect,
    label: &str,
    editor: &Editor,
    active: bool,
    theme: &Theme,
) {
    let fg = parse_color(&theme.fg);
    let border_style = if active {
        Style::default()
            .fg(parse_color(&theme.highlight_bg))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(parse_color(&theme.muted))
    };

    let viewport = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = editor
        .visible_lines(viewport)
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();

    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(fg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(label)
                .border_style(border_style),
        );
    f.render_widget(paragraph, area);

    if active {
        if let Some(pos) = editor.cursor_screen_pos(inner(area)) {
            f.set_cursor_position(pos);
        }
    }
}

pub fn render_task_form(f: &mut Frame, area: Rect, form: &TaskForm, theme: &Theme) {
    let heading = if form.editing_task_id.is_some() {
        "Edit Task"
    } else {
        "New Task"
    };
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(heading)
        .style(Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg)));
    let content = outer.inner(area);
    f.render_widget(outer, area);

    let [title_area, description_area, date_area, time_area] = form_field_areas(content);
    let fields = [
        (title_area, "Title *", &form.title, TaskField::Title),
        (description_area, "Description", &form.description, TaskField::Description),
        (date_area, "Date * (YYYY-MM-DD)", &form.date, TaskField::Date),
        (time_area, "Time * (HH:MM)", &form.time, TaskField::Time),
    ];
    for (field_area, label, editor, field) in fields {
        render_field(f, field_area, label, editor, form.current_field == field, theme);
    }
}
