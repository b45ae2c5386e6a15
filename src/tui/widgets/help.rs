use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::config::{Config, KeyBindings};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup::popup_area;
use crate::utils::format_key_binding_for_display as key;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let theme = config.get_active_theme();
    let style = Style::default()
        .fg(parse_color(&theme.fg))
        .bg(parse_color(&theme.bg));

    let popup_area = popup_area(area, 60, 70);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(&config.key_bindings))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(style),
        )
        .style(style)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup_area);
}

pub fn build_help_text(keys: &KeyBindings) -> String {
    let sections: [(&str, Vec<(String, &str)>); 3] = [
        (
            "Tasks",
            vec![
                (format!("{} / {}", key(&keys.list_up), key(&keys.list_down)), "Move selection"),
                (key(&keys.new), "New task"),
                (format!("{} / Enter", key(&keys.edit)), "Edit selected task"),
                (key(&keys.toggle_completed), "Toggle completed"),
                (key(&keys.delete), "Delete selected task"),
                (key(&keys.sort_date), "Sort by due date"),
                (key(&keys.sort_title), "Sort by title"),
                ("PgUp / PgDn".to_string(), "Scroll details"),
            ],
        ),
        (
            "Task form",
            vec![
                ("Tab / Shift+Tab".to_string(), "Next / previous field"),
                ("Enter".to_string(), "Next field, save on the time field"),
                (key(&keys.save), "Save"),
                (key("Ctrl+z"), "Undo"),
                ("Esc".to_string(), "Cancel"),
            ],
        ),
        (
            "General",
            vec![
                (key(&keys.toggle_theme), "Toggle light/dark theme"),
                (key(&keys.reminders), "Reminder settings"),
                (key(&keys.help), "Show/hide help"),
                (key(&keys.quit), "Quit"),
            ],
        ),
    ];

    let mut text = String::new();
    for (heading, entries) in sections {
        text.push_str(heading);
        text.push_str(":\n");
        for (keys, description) in entries {
            text.push_str(&format!("  {}: {}\n", keys, description));
        }
        text.push('\n');
    }
    text
}
