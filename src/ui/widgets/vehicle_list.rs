//! Latest telemetry per vehicle

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

use crate::api::VehicleTelemetry;
use crate::core::metrics::StatusFilter;
use crate::core::state::{AppState, FocusedPanel};
use crate::ui::theme::Theme;

use super::{panel_block, render_query_status, truncate};

pub struct VehicleList<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> VehicleList<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn render_row(&self, vehicle: &VehicleTelemetry, selected: bool, width: u16) -> Line<'static> {
        let base_style = if selected {
            self.theme.styles.list_item_selected
        } else {
            self.theme.styles.list_item
        };
        let indicator = if selected { "▸" } else { " " };
        let lights = if vehicle.emergency_lights_active { "🚨" } else { "  " };

        let mut spans = vec![
            Span::styled(indicator, base_style),
            Span::styled(format!(" {} ", vehicle.vehicle_type.icon()), base_style),
            Span::styled(
                format!("{:<10}", truncate(&vehicle.vehicle_id, 10)),
                base_style.fg(self.theme.vehicle_type_color(vehicle.vehicle_type)),
            ),
            Span::styled(" ● ", base_style.fg(self.theme.status_color(vehicle.vehicle_status))),
            Span::styled(format!("{:<10}", vehicle.vehicle_status.label()), base_style),
            Span::styled(format!("{:>6.1} km/h ", vehicle.speed), base_style),
            Span::styled(
                format!("{:>5.1}% ", vehicle.fuel_level),
                base_style.fg(self.theme.fuel_color(vehicle.fuel_level)),
            ),
            Span::styled(lights, base_style),
        ];

        if width > 70 {
            spans.push(Span::styled(
                format!(
                    " {:>5.1}°C {:>4.1}V",
                    vehicle.engine_temp, vehicle.battery_voltage
                ),
                base_style.fg(self.theme.colors.fg_secondary),
            ));
        }

        Line::from(spans)
    }
}

impl<'a> Widget for VehicleList<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let focused = self.state.focus_panel == FocusedPanel::Vehicles;
        let filter = self.state.vehicles_panel.filter;
        let visible = self.state.visible_vehicles();

        let title = match filter {
            StatusFilter::All => format!(" VEHICLES ({}) ", visible.len()),
            _ => format!(" VEHICLES ({}) · {} ", visible.len(), filter),
        };
        let block = panel_block(title, focused, self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        if render_query_status(&self.state.data.vehicles, "vehicles", self.theme, inner, buf) {
            return;
        }

        if visible.is_empty() {
            let message = match filter {
                StatusFilter::All => "No vehicles reporting".to_string(),
                _ => format!("No vehicles {}", filter.to_string().to_lowercase()),
            };
            let span = Span::styled(message, Style::default().fg(self.theme.colors.fg_muted));
            buf.set_span(inner.x + 1, inner.y, &span, inner.width.saturating_sub(1));
            return;
        }

        // Keep the selection on screen
        let height = inner.height as usize;
        let selected = self.state.vehicles_panel.selected_index;
        let offset = selected.saturating_sub(height.saturating_sub(1));

        for (row, vehicle) in visible.iter().skip(offset).take(height).enumerate() {
            let is_selected = focused && offset + row == selected;
            let line = self.render_row(vehicle, is_selected, inner.width);
            buf.set_line(inner.x, inner.y + row as u16, &line, inner.width);
        }
    }
}
