//! UI Widgets

pub mod alerts_panel;
pub mod analytics;
pub mod footer;
pub mod header;
pub mod help_overlay;
pub mod stats_cards;
pub mod vehicle_detail;
pub mod vehicle_list;

pub use alerts_panel::AlertsPanel;
pub use analytics::{FleetSummary, FuelByVehicleChart, SpeedByTypeChart, SpeedByVehicleChart, SpeedTrendChart};
pub use footer::Footer;
pub use header::Header;
pub use help_overlay::HelpOverlay;
pub use stats_cards::StatsCards;
pub use vehicle_detail::VehicleDetail;
pub use vehicle_list::VehicleList;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::query::QueryState;
use crate::ui::theme::Theme;

/// Bordered panel with the standard title style
pub(crate) fn panel_block<'a>(title: String, focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if focused {
        theme.styles.panel_border_focused
    } else {
        theme.styles.panel_border
    };

    Block::default()
        .title(Span::styled(title, theme.styles.panel_title))
        .borders(Borders::ALL)
        .border_style(border_style)
        .style(Style::default().bg(theme.colors.bg_primary))
}

/// Renders the loading or error placeholder for a query and returns true
/// when it did, so the caller skips drawing data.
pub(crate) fn render_query_status<T>(
    query: &QueryState<T>,
    what: &str,
    theme: &Theme,
    area: Rect,
    buf: &mut Buffer,
) -> bool {
    let message = if query.is_loading {
        Span::styled(format!("Loading {}…", what), theme.styles.loading)
    } else if query.has_error() {
        Span::styled(format!("Failed to load {}", what), theme.styles.error_text)
    } else {
        return false;
    };

    Paragraph::new(message)
        .alignment(Alignment::Center)
        .render(area, buf);
    true
}

/// Cut a string to a display width, marking the cut with an ellipsis
pub(crate) fn truncate(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate("POL-001", 10), "POL-001");
        assert_eq!(truncate("Engine temperature high", 10), "Engine te…");
        assert_eq!(truncate("🚒🚒🚒", 5), "🚒🚒…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn placeholder_for_loading_and_error() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 30, 1);
        let mut buf = Buffer::empty(area);

        let loading = QueryState::<Vec<u8>>::default();
        assert!(render_query_status(&loading, "alerts", &theme, area, &mut buf));

        let failed = QueryState::<Vec<u8>> {
            is_loading: false,
            error: Some("boom".into()),
            ..Default::default()
        };
        assert!(render_query_status(&failed, "alerts", &theme, area, &mut buf));
        let text: String = (0..area.width).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(text.contains("Failed to load alerts"));

        let ready = QueryState::<Vec<u8>> {
            is_loading: false,
            data: Some(Vec::new()),
            ..Default::default()
        };
        assert!(!render_query_status(&ready, "alerts", &theme, area, &mut buf));
    }
}
