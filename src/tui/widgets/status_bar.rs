use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::config::Theme;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::task_list::truncate;

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

/// Join as many hints as fit in `max_width`, ending with "..." when some were dropped
pub fn fit_key_hints(key_hints: &[String], max_width: usize) -> String {
    let mut text = String::new();
    for hint in key_hints {
        let candidate = if text.is_empty() {
            hint.clone()
        } else {
            format!("{}{}{}", text, SEPARATOR, hint)
        };
        if candidate.chars().count() > max_width {
            if text.is_empty() {
                return truncate(hint, max_width);
            }
            if text.chars().count() + ELLIPSIS.len() <= max_width {
                text.push_str(ELLIPSIS);
            }
            return text;
        }
        text = candidate;
    }
    text
}

pub fn render_status_bar(
    f: &mut Frame,
    area: Rect,
    message: Option<&str>,
    key_hints: &[String],
    theme: &Theme,
) {
    let max_width = area.width as usize;
    let (content, style) = match message {
        // Messages get the highlight background so they stand out
        Some(msg) => {
            let highlight_bg = parse_color(&theme.highlight_bg);
            (
                truncate(msg, max_width),
                Style::default()
                    .fg(get_contrast_text_color(highlight_bg))
                    .bg(highlight_bg)
                    .add_modifier(Modifier::BOLD),
            )
        }
        None => (
            fit_key_hints(key_hints, max_width),
            Style::default()
                .fg(parse_color(&theme.fg))
                .bg(parse_color(&theme.bg)),
        ),
    };

    f.render_widget(Paragraph::new(content).style(style), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> Vec<String> {
        vec!["q: Quit".to_string(), "n: New".to_string(), "F1: Help".to_string()]
    }

    #[test]
    fn all_hints_fit() {
        assert_eq!(fit_key_hints(&hints(), 80), "q: Quit • n: New • F1: Help");
    }

    #[test]
    fn overflow_ends_with_ellipsis() {
        assert_eq!(fit_key_hints(&hints(), 20), "q: Quit • n: New...");
    }

    #[test]
    fn first_hint_is_truncated_when_alone_too_long() {
        assert_eq!(fit_key_hints(&hints(), 5), "q:...");
    }
}
