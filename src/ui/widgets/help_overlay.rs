//! Help overlay widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::ui::theme::Theme;

const SECTIONS: [(&str, &[(&str, &str)]); 4] = [
    (
        "General",
        &[
            ("q", "Quit"),
            ("?", "Toggle help"),
            ("Tab", "Switch dashboard / analytics"),
            ("r", "Refetch everything on screen"),
        ],
    ),
    (
        "Dashboard",
        &[
            ("←/→", "Switch panel focus"),
            ("↑/k ↓/j", "Move selection"),
            ("s", "Cycle vehicle status filter"),
            ("Enter", "Open vehicle telemetry"),
        ],
    ),
    (
        "Alerts",
        &[
            ("a", "Acknowledge selected alert"),
            ("x", "Resolve selected alert"),
        ],
    ),
    (
        "Analytics",
        &[("[ / ]", "Shorter / longer history range")],
    ),
];

pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(Span::styled(" Fleetwatch Help ", self.theme.styles.panel_title))
            .title_bottom(Line::from(" Press Esc or ? to close ").centered())
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border_focused)
            .style(Style::default().bg(self.theme.colors.bg_secondary));

        let inner = block.inner(area);
        block.render(area, buf);

        let bottom = inner.y + inner.height;
        let mut y = inner.y;

        'sections: for (section, bindings) in SECTIONS {
            if y >= bottom {
                break;
            }

            let header = Line::from(Span::styled(
                format!("─── {} ", section),
                Style::default()
                    .fg(self.theme.colors.accent_primary)
                    .add_modifier(Modifier::BOLD),
            ));
            buf.set_line(inner.x + 1, y, &header, inner.width.saturating_sub(2));
            y += 1;

            for (key, desc) in bindings {
                if y >= bottom {
                    break 'sections;
                }
                let line = Line::from(vec![
                    Span::styled(format!("  {:>9}  ", key), self.theme.styles.keybind_key),
                    Span::styled(*desc, self.theme.styles.keybind),
                ]);
                buf.set_line(inner.x + 1, y, &line, inner.width.saturating_sub(2));
                y += 1;
            }

            y += 1;
        }
    }
}
