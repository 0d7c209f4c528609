//! Dashboard stat cards

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::core::metrics::DashboardStats;
use crate::core::state::AppState;
use crate::ui::theme::Theme;

use super::{panel_block, render_query_status};

pub struct StatsCards<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> StatsCards<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn card(&self, title: &str, lines: Vec<Line<'static>>, area: Rect, buf: &mut Buffer) {
        let block = panel_block(format!(" {} ", title), false, self.theme);
        let inner = block.inner(area);
        block.render(area, buf);
        Paragraph::new(lines).render(inner, buf);
    }

    fn stat(&self, value: String, label: &'static str) -> Line<'static> {
        Line::from(vec![
            Span::styled(value, self.theme.styles.stat_value),
            Span::styled(format!(" {}", label), self.theme.styles.stat_label),
        ])
    }
}

impl<'a> Widget for StatsCards<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        let data = &self.state.data;
        let stats = DashboardStats::compute(data.vehicles(), data.alerts());

        // Vehicles
        let block = panel_block(" VEHICLES ".to_string(), false, self.theme);
        let inner = block.inner(cards[0]);
        block.render(cards[0], buf);
        if !render_query_status(&data.vehicles, "vehicles", self.theme, inner, buf) {
            Paragraph::new(vec![
                self.stat(stats.available.to_string(), "available"),
                self.stat(stats.total_vehicles.to_string(), "total"),
            ])
            .render(inner, buf);
        }

        // Alerts
        let block = panel_block(" ALERTS ".to_string(), false, self.theme);
        let inner = block.inner(cards[1]);
        block.render(cards[1], buf);
        if !render_query_status(&data.alerts, "alerts", self.theme, inner, buf) {
            Paragraph::new(vec![
                Line::from(vec![
                    Span::styled(stats.alerts.critical.to_string(), self.theme.styles.alert_critical),
                    Span::styled(" critical", self.theme.styles.stat_label),
                ]),
                Line::from(vec![
                    Span::styled(stats.alerts.warning.to_string(), self.theme.styles.alert_warning),
                    Span::styled(" warning", self.theme.styles.stat_label),
                ]),
            ])
            .render(inner, buf);
        }

        self.card(
            "AVERAGES",
            vec![
                self.stat(format!("{:.1} km/h", stats.averages.speed), "speed"),
                Line::from(vec![
                    Span::styled(
                        format!("{:.1}%", stats.averages.fuel_level),
                        Style::default().fg(self.theme.fuel_color(stats.averages.fuel_level)),
                    ),
                    Span::styled(" fuel", self.theme.styles.stat_label),
                ]),
            ],
            cards[2],
            buf,
        );

        let overview: Vec<Span<'static>> = stats
            .by_status
            .iter()
            .flat_map(|(status, count)| {
                [
                    Span::styled("● ", Style::default().fg(self.theme.status_color(*status))),
                    Span::styled(format!("{} {}  ", status.short_label(), count), self.theme.styles.list_item),
                ]
            })
            .collect();
        let (first, second) = overview.split_at(overview.len().min(4));
        self.card(
            "STATUS",
            vec![Line::from(first.to_vec()), Line::from(second.to_vec())],
            cards[3],
            buf,
        );
    }
}
