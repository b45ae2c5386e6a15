use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub list_area: Rect,
    pub detail_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Smallest usable inner size: list (20) + detail (20) wide, form fields tall
    pub const MIN_WIDTH: u16 = 40;
    pub const MIN_HEIGHT: u16 = 14;

    /// Share of the inner width given to the task list
    pub const LIST_WIDTH_PERCENT: u16 = 45;

    pub fn calculate(size: Rect) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // List + detail
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(Self::LIST_WIDTH_PERCENT),
                Constraint::Min(20),
            ])
            .split(vertical[0]);

        Self {
            inner_area,
            list_area: horizontal[0],
            detail_area: horizontal[1],
            status_area: vertical[1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_list_detail_and_status() {
        let layout = Layout::calculate(Rect::new(0, 0, 102, 32));
        assert_eq!(layout.inner_area, Rect::new(1, 1, 100, 30));
        assert_eq!(layout.status_area.height, 1);
        assert_eq!(layout.status_area.y, 30);
        assert_eq!(layout.list_area.width, 45);
        assert_eq!(layout.detail_area.width, 55);
        assert_eq!(layout.list_area.height, 29);
    }

    #[test]
    fn tiny_terminal_is_padded_to_minimum() {
        let layout = Layout::calculate(Rect::new(0, 0, 10, 5));
        assert_eq!(layout.inner_area.width, Layout::MIN_WIDTH);
        assert_eq!(layout.inner_area.height, Layout::MIN_HEIGHT);
    }
}
