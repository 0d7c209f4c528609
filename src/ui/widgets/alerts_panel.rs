//! Active alerts panel

use chrono::Utc;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

use crate::api::Alert;
use crate::core::state::{AppState, FocusedPanel};
use crate::ui::theme::Theme;

use super::{panel_block, render_query_status, truncate};

pub struct AlertsPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> AlertsPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    /// Two lines per alert: type and vehicle, then the message
    fn render_alert(&self, alert: &Alert, selected: bool, width: usize) -> [Line<'static>; 2] {
        let base_style = if selected {
            self.theme.styles.list_item_selected
        } else {
            self.theme.styles.list_item
        };
        let indicator = if selected { "▸" } else { " " };
        let icon = if alert.is_critical() { "✖" } else { "▲" };

        let minutes = Utc::now()
            .signed_duration_since(alert.created_at)
            .num_minutes()
            .max(0);
        let age = if minutes < 60 {
            format!("{}m", minutes)
        } else {
            format!("{}h", minutes / 60)
        };

        let title = Line::from(vec![
            Span::styled(indicator, base_style),
            Span::styled(format!(" {} ", icon), self.theme.alert_style(alert)),
            Span::styled(
                format!("{:<24}", truncate(&alert.alert_type.label(), 24)),
                base_style.patch(self.theme.alert_style(alert)),
            ),
            Span::styled(format!(" {} ", alert.vehicle_id), base_style),
            Span::styled(age, base_style.fg(self.theme.colors.fg_muted)),
        ]);

        let detail = format!(
            "{} ({:.1} / {:.1})",
            alert.message, alert.actual_value, alert.threshold_value
        );
        let message = Line::from(Span::styled(
            format!("    {}", truncate(&detail, width.saturating_sub(4))),
            Style::default().fg(self.theme.colors.fg_secondary),
        ));

        [title, message]
    }
}

impl<'a> Widget for AlertsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let focused = self.state.focus_panel == FocusedPanel::Alerts;
        let alerts = self.state.data.alerts();

        let block = panel_block(format!(" ACTIVE ALERTS ({}) ", alerts.len()), focused, self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        if render_query_status(&self.state.data.alerts, "alerts", self.theme, inner, buf) {
            return;
        }

        if alerts.is_empty() {
            let span = Span::styled("✓ No active alerts", self.theme.styles.notification_success);
            buf.set_span(inner.x + 1, inner.y, &span, inner.width.saturating_sub(1));
            return;
        }

        let per_page = (inner.height / 2).max(1) as usize;
        let selected = self.state.alerts_panel.selected_index;
        let offset = selected.saturating_sub(per_page - 1);

        let mut y = inner.y;
        for (i, alert) in alerts.iter().enumerate().skip(offset).take(per_page) {
            let is_selected = focused && i == selected;
            for line in self.render_alert(alert, is_selected, inner.width as usize) {
                if y >= inner.y + inner.height {
                    return;
                }
                buf.set_line(inner.x, y, &line, inner.width);
                y += 1;
            }
        }
    }
}
