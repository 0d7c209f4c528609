//! Vehicle telemetry overlay

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Sparkline, Widget},
};

use crate::api::VehicleTelemetry;
use crate::core::charts::palette_color;
use crate::core::query::QueryState;
use crate::ui::theme::{chart_color, Theme};

use super::render_query_status;

pub struct VehicleDetail<'a> {
    vehicle_id: &'a str,
    query: Option<&'a QueryState<Vec<VehicleTelemetry>>>,
    theme: &'a Theme,
}

impl<'a> VehicleDetail<'a> {
    pub fn new(
        vehicle_id: &'a str,
        query: Option<&'a QueryState<Vec<VehicleTelemetry>>>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            vehicle_id,
            query,
            theme,
        }
    }

    fn reading_lines(&self, latest: &VehicleTelemetry, samples: usize) -> Vec<Line<'static>> {
        let label = |text: &str| Span::styled(format!("{:<14}", text), self.theme.styles.stat_label);
        let value = |text: String| Span::styled(text, self.theme.styles.stat_value);
        let (lat, lon) = latest.position();

        vec![
            Line::from(vec![
                label("Type"),
                value(format!("{} {}", latest.vehicle_type.icon(), latest.vehicle_type.label())),
            ]),
            Line::from(vec![
                label("Status"),
                Span::styled(
                    latest.vehicle_status.label().to_string(),
                    Style::default().fg(self.theme.status_color(latest.vehicle_status)),
                ),
            ]),
            Line::from(vec![label("Position"), value(format!("{:.5}, {:.5}", lat, lon))]),
            Line::from(vec![label("Speed"), value(format!("{:.1} km/h", latest.speed))]),
            Line::from(vec![
                label("Fuel"),
                Span::styled(
                    format!("{:.1}%", latest.fuel_level),
                    Style::default().fg(self.theme.fuel_color(latest.fuel_level)),
                ),
            ]),
            Line::from(vec![label("Engine temp"), value(format!("{:.1} °C", latest.engine_temp))]),
            Line::from(vec![label("Battery"), value(format!("{:.2} V", latest.battery_voltage))]),
            Line::from(vec![
                label("Lights"),
                value(if latest.emergency_lights_active { "on" } else { "off" }.to_string()),
            ]),
            Line::from(vec![
                label("Last report"),
                value(latest.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            ]),
            Line::from(vec![label("Samples"), value(samples.to_string())]),
        ]
    }

    fn sparkline(&self, title: &str, data: &[u64], max: u64, color_index: usize, area: Rect, buf: &mut Buffer) {
        let color = chart_color(palette_color(color_index));
        Sparkline::default()
            .block(
                Block::default()
                    .title(Span::styled(title.to_string(), self.theme.styles.stat_label))
                    .borders(Borders::TOP)
                    .border_style(self.theme.styles.panel_border),
            )
            .data(data)
            .max(max)
            .style(Style::default().fg(color))
            .render(area, buf);
    }
}

impl<'a> Widget for VehicleDetail<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(Span::styled(format!(" {} ", self.vehicle_id), self.theme.styles.panel_title))
            .title_bottom(Line::from(" Esc to close ").centered())
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border_focused)
            .style(Style::default().bg(self.theme.colors.bg_secondary));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(query) = self.query else {
            return;
        };
        if render_query_status(query, "telemetry", self.theme, inner, buf) {
            return;
        }

        let mut history: Vec<&VehicleTelemetry> = query.data.iter().flatten().collect();
        history.sort_by_key(|t| t.timestamp);
        let Some(latest) = history.last().copied() else {
            Paragraph::new(Span::styled(
                "No telemetry recorded for this vehicle",
                Style::default().fg(self.theme.colors.fg_muted),
            ))
            .render(inner, buf);
            return;
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(11), Constraint::Min(3), Constraint::Min(3)])
            .split(inner);

        Paragraph::new(self.reading_lines(latest, history.len())).render(rows[0], buf);

        let speeds: Vec<u64> = history.iter().map(|t| t.speed.max(0.0).round() as u64).collect();
        let fuel: Vec<u64> = history.iter().map(|t| t.fuel_level.clamp(0.0, 100.0).round() as u64).collect();
        let speed_max = speeds.iter().copied().max().unwrap_or(0).max(1);

        self.sparkline(" Speed ", &speeds, speed_max, 0, rows[1], buf);
        self.sparkline(" Fuel ", &fuel, 100, 1, rows[2], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::VehicleStatus;
    use crate::core::metrics::fixtures::vehicle;

    fn text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_shows_latest_reading() {
        let mut older = vehicle("AMB-001", VehicleStatus::Idle, 10.0, 90.0);
        older.timestamp -= chrono::Duration::minutes(5);
        let newer = vehicle("AMB-001", VehicleStatus::EnRoute, 72.5, 64.0);
        let query = QueryState {
            data: Some(vec![newer, older]),
            is_loading: false,
            ..QueryState::default()
        };
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 24);
        let mut buf = Buffer::empty(area);

        VehicleDetail::new("AMB-001", Some(&query), &theme).render(area, &mut buf);

        let text = text(&buf);
        assert!(text.contains("AMB-001"));
        assert!(text.contains("72.5 km/h"));
        assert!(text.contains("64.0%"));
    }

    #[test]
    fn test_empty_history_message() {
        let query = QueryState {
            data: Some(Vec::new()),
            is_loading: false,
            ..QueryState::default()
        };
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);

        VehicleDetail::new("FIRE-9", Some(&query), &theme).render(area, &mut buf);

        assert!(text(&buf).contains("No telemetry recorded"));
    }
}
