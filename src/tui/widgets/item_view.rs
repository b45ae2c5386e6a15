use chrono::{Local, NaiveDateTime};
use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;
use ratskin::RatSkin;
use std::cmp;
use termimad::minimad::Text as MinimadText;

use crate::classify::{classify, due_label_with_badge, DueStatus};
use crate::config::Theme;
use crate::models::Task;
use crate::tui::widgets::color::parse_color;

/// Markdown shown in the detail pane. The description is user markdown.
pub fn get_content_string(task: &Task, now: NaiveDateTime) -> String {
    let status = if task.completed {
        "Completed"
    } else {
        match classify(task, now) {
            DueStatus::Overdue => "Overdue",
            DueStatus::DueSoon => "Due soon",
            DueStatus::Normal => "Pending",
        }
    };

    let mut content = format!("# {}\n\n", task.title);
    content.push_str(&format!("**Status:** {}\n", status));
    content.push_str(&format!("**Due:** {}\n", due_label_with_badge(task, now)));
    content.push_str(&format!(
        "**Created:** {}\n",
        task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    ));

    if !task.description.is_empty() {
        content.push_str("\n---\n\n");
        content.push_str(&task.description);
        content.push('\n');
    }
    content
}

pub fn render_item_view(
    f: &mut Frame,
    area: Rect,
    task: Option<&Task>,
    now: NaiveDateTime,
    theme: &Theme,
    scroll_offset: usize,
) {
    if area.width < 2 || area.height < 2 {
        return;
    }
    let base_style = Style::default().fg(parse_color(&theme.fg));

    let Some(task) = task else {
        let paragraph = Paragraph::new("No tasks yet. Press n to add one.")
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .style(base_style);
        f.render_widget(paragraph, area);
        return;
    };

    let horizontal = RatLayout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let content_area = horizontal[0];
    let scrollbar_area = horizontal[1];

    let viewport_height = area.height.saturating_sub(2) as usize;
    let text_width: u16 = content_area.width.saturating_sub(2);

    // ratskin wraps to the given width and styles spans for ratatui
    let markdown = get_content_string(task, now);
    let parsed = RatSkin::default().parse(MinimadText::from(markdown.as_str()), text_width);
    let lines: Vec<Line> = parsed
        .into_iter()
        .map(|line| {
            Line::from(
                line.spans
                    .into_iter()
                    .map(|span| Span::styled(span.content.to_string(), span.style))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    let total_lines = lines.len();
    let scroll_offset = cmp::min(scroll_offset, total_lines.saturating_sub(viewport_height));
    let end_line = cmp::min(scroll_offset + viewport_height, total_lines);
    let visible_text = Text::from(lines[scroll_offset..end_line].to_vec());

    // trim: false keeps list indentation
    let paragraph = Paragraph::new(visible_text)
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .style(base_style)
        .wrap(ratatui::widgets::Wrap { trim: false });
    f.render_widget(paragraph, content_area);

    if total_lines > viewport_height {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            content_area.y + 1,
            scrollbar_area.width,
            content_area.height.saturating_sub(2),
        );
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .viewport_content_length(viewport_height)
            .position(scroll_offset);
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}
