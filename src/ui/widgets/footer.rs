//! Footer widget with keybindings

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::core::state::{AppMode, AppState, Screen};
use crate::ui::theme::Theme;

pub struct Footer<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Footer<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn bindings(&self) -> Vec<(&'static str, &'static str)> {
        match (&self.state.mode, self.state.screen) {
            (AppMode::Help, _) => vec![("Esc", "Close")],
            (AppMode::VehicleDetail { .. }, _) => vec![("Esc", "Close"), ("r", "Refresh")],
            (AppMode::Normal, Screen::Dashboard) => vec![
                ("Tab", "Analytics"),
                ("←/→", "Panel"),
                ("j/k", "Select"),
                ("s", "Filter"),
                ("Enter", "Details"),
                ("a", "Ack"),
                ("x", "Resolve"),
                ("r", "Refresh"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
            (AppMode::Normal, Screen::Analytics) => vec![
                ("Tab", "Dashboard"),
                ("[/]", "Range"),
                ("r", "Refresh"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
        }
    }
}

impl<'a> Widget for Footer<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.theme.styles.footer);

        let mut spans = Vec::new();
        for (i, (key, action)) in self.bindings().into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", self.theme.styles.keybind));
            }
            spans.push(Span::styled(format!("[{}]", key), self.theme.styles.keybind_key));
            spans.push(Span::styled(format!(" {}", action), self.theme.styles.keybind));
        }

        let line = Line::from(spans);
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));
    }
}
