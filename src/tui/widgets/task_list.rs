use chrono::NaiveDateTime;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Scrollbar, ScrollbarOrientation, ScrollbarState,
    StatefulWidget,
};
use ratatui::Frame;

use crate::classify::{classify, DueStatus};
use crate::config::Theme;
use crate::models::Task;
use crate::sort::SortCriterion;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color, task_color};

/// Shorten `text` to `max_width` chars, marking the cut with "..."
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    text.chars().take(max_width.saturating_sub(3)).collect::<String>() + "..."
}

fn task_item(task: &Task, now: NaiveDateTime, max_width: usize, theme: &Theme) -> ListItem<'static> {
    let status = classify(task, now);
    let marker = if task.completed { "✓" } else { "○" };
    let color = task_color(theme, task.completed, status);

    let mut title_style = Style::default().fg(color);
    if task.completed {
        title_style = title_style.add_modifier(Modifier::CROSSED_OUT);
    }
    if status == DueStatus::Overdue {
        title_style = title_style.add_modifier(Modifier::BOLD);
    }

    let title = truncate(&format!("{} {}", marker, task.title), max_width);
    let due = truncate(&format!("  {}{}", task.due_label(), status.badge()), max_width);

    ListItem::new(vec![
        Line::from(Span::styled(title, title_style)),
        Line::from(Span::styled(due, Style::default().fg(color))),
    ])
}

pub fn render_task_list(
    f: &mut Frame,
    area: Rect,
    tasks: &[Task],
    now: NaiveDateTime,
    list_state: &mut ListState,
    sort: SortCriterion,
    theme: &Theme,
) {
    // 2 for borders, 2 for padding
    let max_width = area.width.saturating_sub(4) as usize;

    let highlight_bg = parse_color(&theme.highlight_bg);
    let highlight_fg = if theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&theme.highlight_fg)
    };

    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| task_item(task, now, max_width, theme))
        .collect();
    let total_items = items.len();

    // Reserve a column for the scrollbar
    let areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let list_area = areas[0];
    let scrollbar_area = areas[1];

    let title = format!("Tasks ({}) by {}", tasks.len(), sort);
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(parse_color(&theme.fg)))
        .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg));

    StatefulWidget::render(list, list_area, f.buffer_mut(), list_state);

    // Each task takes two rows
    let visible_items = (list_area.height.saturating_sub(2) / 2) as usize;
    if total_items > visible_items && visible_items > 0 && scrollbar_area.width > 0 {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            list_area.y + 1,
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );

        let selected_index = list_state.selected().unwrap_or(0);
        let scroll_position = selected_index.saturating_sub(visible_items - 1);

        let mut scrollbar_state = ScrollbarState::new(total_items)
            .viewport_content_length(visible_items)
            .position(scroll_position);

        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");

        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}
