//! Analytics screen: fleet summary and historical charts

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Direction, Rect},
    style::Style,
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Chart, Dataset, GraphType, Paragraph, Widget,
    },
};

use crate::api::HistoricalMetricsResponse;
use crate::core::charts;
use crate::core::state::AppState;
use crate::ui::theme::{chart_color, Theme};

use super::{panel_block, render_query_status};

/// Bar heights are stored in tenths so one decimal survives the u64 cast
const BAR_SCALE: f64 = 10.0;

fn scaled(value: f64) -> u64 {
    (value * BAR_SCALE).round().max(0.0) as u64
}

fn render_empty(message: &str, theme: &Theme, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(
        message.to_string(),
        Style::default().fg(theme.colors.fg_muted),
    ))
    .alignment(Alignment::Center)
    .render(area, buf);
}

/// Shared body of every bar chart panel. Returns early with a placeholder
/// when the history query is not ready or the series is empty.
#[allow(clippy::too_many_arguments)]
fn render_bars(
    state: &AppState,
    title: String,
    series: &[charts::Bar],
    unit: &str,
    direction: Direction,
    theme: &Theme,
    area: Rect,
    buf: &mut Buffer,
) {
    let block = panel_block(title, false, theme);
    let inner = block.inner(area);
    block.render(area, buf);

    if render_query_status(&state.data.history, "historical metrics", theme, inner, buf) {
        return;
    }
    if series.is_empty() {
        render_empty("No data for this range", theme, inner, buf);
        return;
    }

    let bars: Vec<Bar> = series
        .iter()
        .map(|bar| {
            let color = chart_color(bar.color);
            Bar::default()
                .value(scaled(bar.value))
                .label(Line::from(bar.label.clone()))
                .text_value(format!("{:.1}{}", bar.value, unit))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(theme.colors.bg_primary).bg(color))
        })
        .collect();

    let bar_width = match direction {
        Direction::Horizontal => 1,
        Direction::Vertical => {
            let count = series.len() as u16;
            (inner.width.saturating_sub(count) / count.max(1)).clamp(3, 12)
        }
    };

    BarChart::default()
        .direction(direction)
        .bar_width(bar_width)
        .bar_gap(1)
        .label_style(Style::default().fg(theme.colors.fg_secondary))
        .data(BarGroup::default().bars(&bars))
        .render(inner, buf);
}

fn history(state: &AppState) -> Option<&HistoricalMetricsResponse> {
    state.data.history.data.as_ref()
}

/// Live totals plus the totals of the selected range
pub struct FleetSummary<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> FleetSummary<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn pair(&self, label: &str, value: String) -> [Span<'static>; 2] {
        [
            Span::styled(format!("{}: ", label), self.theme.styles.stat_label),
            Span::styled(format!("{}   ", value), self.theme.styles.stat_value),
        ]
    }
}

impl<'a> Widget for FleetSummary<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (from, to) = self.state.history_range.bounds();
        let block = panel_block(
            format!(" FLEET · {} → {} ", from, to),
            false,
            self.theme,
        );
        let inner = block.inner(area);
        block.render(area, buf);

        if render_query_status(&self.state.data.fleet, "fleet analytics", self.theme, inner, buf) {
            return;
        }

        let mut lines = Vec::new();

        if let Some(fleet) = &self.state.data.fleet.data {
            let mut live: Vec<Span> = Vec::new();
            live.extend(self.pair("Vehicles", fleet.total_vehicles.to_string()));
            live.extend(self.pair("Telemetry", fleet.total_telemetry_received.to_string()));
            live.extend(self.pair("Avg speed", format!("{:.1} km/h", fleet.fleet_average_speed)));
            live.extend(self.pair("Fuel used", format!("{:.1} L", fleet.total_fuel_consumed)));
            lines.push(Line::from(live));

            let overview: Vec<Span> = fleet
                .current_status_overview
                .iter()
                .flat_map(|(status, count)| {
                    [
                        Span::styled("● ", Style::default().fg(self.theme.status_color(*status))),
                        Span::styled(
                            format!("{} {}  ", status.label(), count),
                            self.theme.styles.list_item,
                        ),
                    ]
                })
                .collect();
            lines.push(Line::from(overview));
        }

        match history(self.state) {
            Some(history) => {
                let mut range: Vec<Span> = Vec::new();
                range.extend(self.pair(
                    "Days with data",
                    format!("{}/{}", history.covered_days(), history.total_days),
                ));
                range.extend(self.pair(
                    "Range avg speed",
                    history
                        .average_fleet_speed
                        .map(|v| format!("{:.1} km/h", v))
                        .unwrap_or_else(|| "n/a".to_string()),
                ));
                range.extend(self.pair(
                    "Range fuel",
                    history
                        .total_fuel_consumed
                        .map(|v| format!("{:.1} L", v))
                        .unwrap_or_else(|| "n/a".to_string()),
                ));
                range.extend(self.pair("Data points", history.total_data_points.to_string()));
                lines.push(Line::from(range));
            }
            None if self.state.data.history.has_error() => lines.push(Line::from(Span::styled(
                "Failed to load historical metrics",
                self.theme.styles.error_text,
            ))),
            None => lines.push(Line::from(Span::styled(
                "Loading historical metrics…",
                self.theme.styles.loading,
            ))),
        }

        Paragraph::new(lines).render(inner, buf);
    }
}

/// Daily fleet average speed as a line
pub struct SpeedTrendChart<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> SpeedTrendChart<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for SpeedTrendChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = format!(" AVG SPEED TREND · {}D ", self.state.history_range.days);
        let block = panel_block(title, false, self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        if render_query_status(&self.state.data.history, "historical metrics", self.theme, inner, buf) {
            return;
        }

        let points = history(self.state)
            .map(|h| charts::speed_trend(&h.daily_fleet_metrics))
            .unwrap_or_default();
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            render_empty("No speed data for this range", self.theme, inner, buf);
            return;
        };

        let data: Vec<(f64, f64)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.value))
            .collect();
        let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
        let y_max = (max * 1.1).max(1.0);
        let x_max = (points.len() - 1).max(1) as f64;

        let color = chart_color(charts::palette_color(0));
        let dataset = Dataset::default()
            .name("km/h")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(&data);

        let axis_style = Style::default().fg(self.theme.colors.fg_muted);
        Chart::new(vec![dataset])
            .x_axis(
                Axis::default()
                    .style(axis_style)
                    .bounds([0.0, x_max])
                    .labels(vec![Span::raw(first.label.clone()), Span::raw(last.label.clone())]),
            )
            .y_axis(
                Axis::default()
                    .style(axis_style)
                    .bounds([0.0, y_max])
                    .labels(vec![
                        Span::raw("0"),
                        Span::raw(format!("{:.0}", y_max / 2.0)),
                        Span::raw(format!("{:.0}", y_max)),
                    ]),
            )
            .render(inner, buf);
    }
}

/// Average speed per vehicle type for the most recent day with data,
/// falling back to the live snapshot
pub struct SpeedByTypeChart<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> SpeedByTypeChart<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for SpeedByTypeChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let speeds = history(self.state)
            .and_then(charts::latest_speed_by_type)
            .filter(|speeds| !speeds.is_empty())
            .or_else(|| {
                self.state
                    .data
                    .fleet
                    .data
                    .as_ref()
                    .map(|fleet| &fleet.average_speed_by_type)
            });
        let series = speeds.map(charts::speed_by_type).unwrap_or_default();

        render_bars(
            self.state,
            " SPEED BY TYPE ".to_string(),
            &series,
            "",
            Direction::Vertical,
            self.theme,
            area,
            buf,
        );
    }
}

pub struct SpeedByVehicleChart<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> SpeedByVehicleChart<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for SpeedByVehicleChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let series = history(self.state)
            .map(|h| charts::speed_by_vehicle(&h.daily_vehicle_metrics))
            .unwrap_or_default();

        render_bars(
            self.state,
            format!(" SPEED BY VEHICLE · {}D ", self.state.history_range.days),
            &series,
            " km/h",
            Direction::Horizontal,
            self.theme,
            area,
            buf,
        );
    }
}

pub struct FuelByVehicleChart<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> FuelByVehicleChart<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for FuelByVehicleChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let series = history(self.state)
            .map(|h| charts::fuel_by_vehicle(&h.daily_vehicle_metrics, &h.vehicle_fuel_consumption))
            .unwrap_or_default();

        render_bars(
            self.state,
            format!(" FUEL CONSUMED · {}D ", self.state.history_range.days),
            &series,
            " L",
            Direction::Horizontal,
            self.theme,
            area,
            buf,
        );
    }
}
