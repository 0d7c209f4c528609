//! Header widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::core::metrics::alert_split;
use crate::core::state::{AppState, Screen};
use crate::ui::theme::Theme;

pub struct Header<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn separator(&self) -> Span<'static> {
        Span::styled(" │ ", Style::default().fg(self.theme.colors.fg_muted))
    }

    fn tab(&self, screen: Screen) -> Span<'static> {
        if self.state.screen == screen {
            Span::styled(
                format!("[{}]", screen.title()),
                Style::default()
                    .fg(self.theme.colors.accent_primary)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(
                format!(" {} ", screen.title()),
                Style::default().fg(self.theme.colors.fg_secondary),
            )
        }
    }
}

impl<'a> Widget for Header<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.theme.styles.header);

        let env_color = if self.state.production {
            self.theme.colors.error
        } else {
            self.theme.colors.success
        };

        let mut spans = vec![
            Span::styled(
                " 🚨 FLEETWATCH ",
                Style::default()
                    .fg(self.theme.colors.accent_primary)
                    .add_modifier(Modifier::BOLD),
            ),
            self.separator(),
            self.tab(Screen::Dashboard),
            Span::raw(" "),
            self.tab(Screen::Analytics),
            self.separator(),
            Span::styled(self.state.environment.clone(), Style::default().fg(env_color)),
        ];

        let split = alert_split(self.state.data.alerts());
        if split.critical > 0 {
            spans.push(self.separator());
            spans.push(Span::styled(
                format!("⚠ {} critical", split.critical),
                self.theme.styles.alert_critical,
            ));
        }

        if self.state.actions_busy {
            spans.push(self.separator());
            spans.push(Span::styled("⟳ updating", self.theme.styles.loading));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        // Backend and clock on the right
        let right = format!("{}  {} ", self.state.base_url, chrono::Local::now().format("%H:%M:%S"));
        let right_width = right.chars().count() as u16;
        if right_width < area.width / 2 {
            let span = Span::styled(right, Style::default().fg(self.theme.colors.fg_muted));
            buf.set_span(area.x + area.width - right_width, area.y, &span, right_width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn environment_color(production: bool) -> Option<Color> {
        let theme = Theme::default();
        let mut state = AppState::new(theme.clone(), "fleet-prod".into(), "http://api".into(), 7);
        state.production = production;
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);

        Header::new(&state, &theme).render(area, &mut buf);

        let cells = buf.content();
        let symbols: Vec<&str> = cells.iter().map(|c| c.symbol()).collect();
        let start = (0..symbols.len()).find(|&i| symbols[i..].starts_with(&["f", "l", "e", "e", "t", "-"]))?;
        Some(cells[start].fg)
    }

    #[test]
    fn test_production_environment_is_highlighted() {
        let theme = Theme::default();
        assert_eq!(environment_color(true), Some(theme.colors.error));
        assert_eq!(environment_color(false), Some(theme.colors.success));
    }
}
