use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::config::Theme;
use crate::reminder::Alert;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};

/// Centered rect covering the given percentage of `area`.
/// Based on the ratatui popup example: https://ratatui.rs/examples/apps/popup/
pub fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

/// Bordered, cleared popup with the theme's colors
pub fn render_popup(f: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'_>>, theme: &Theme) {
    let style = Style::default()
        .fg(parse_color(&theme.fg))
        .bg(parse_color(&theme.bg));
    f.render_widget(Clear, area);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .title_alignment(Alignment::Center)
                .style(style),
        )
        .style(style)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

/// One line per option, the selected one highlighted and marked with ">"
pub fn option_lines(options: &[&str], selection: usize, theme: &Theme) -> Vec<Line<'static>> {
    let highlight_bg = parse_color(&theme.highlight_bg);
    let selected = Style::default()
        .fg(get_contrast_text_color(highlight_bg))
        .bg(highlight_bg);
    let normal = Style::default()
        .fg(parse_color(&theme.fg))
        .bg(parse_color(&theme.bg));

    options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            if index == selection {
                Line::from(Span::styled(format!("> {}", option), selected))
            } else {
                Line::from(Span::styled(format!("  {}", option), normal))
            }
        })
        .collect()
}

pub fn render_alert(f: &mut Frame, area: Rect, alert: &Alert, queued: usize, theme: &Theme) {
    let mut lines = vec![
        Line::from(Span::styled(
            alert.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(alert.body.clone()),
        Line::from(""),
    ];
    if queued > 1 {
        lines.push(Line::from(format!("({} more)", queued - 1)));
    }
    lines.push(Line::from("Press any key to dismiss"));

    render_popup(f, popup_area(area, 50, 30), "🔔 Reminder", lines, theme);
}

pub fn render_reminder_prompt(f: &mut Frame, area: Rect, options: &[&str], selection: usize, theme: &Theme) {
    let mut lines = vec![
        Line::from("Get an alert when a task is due?"),
        Line::from(""),
    ];
    lines.extend(option_lines(options, selection, theme));
    lines.push(Line::from(""));
    lines.push(Line::from("↑↓ to choose, Enter to confirm, Esc for not now"));

    render_popup(f, popup_area(area, 50, 35), "Reminders", lines, theme);
}
