//! Main UI renderer

use ratatui::{
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Block, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::state::{AppMode, AppState, NotificationLevel};
use crate::ui::layout::LayoutManager;
use crate::ui::widgets::*;

const MAX_NOTIFICATION_WIDTH: u16 = 48;

pub struct Renderer;

impl Renderer {
    pub fn render(frame: &mut Frame, state: &AppState) {
        let area = frame.area();
        let theme = &state.theme;

        frame.render_widget(
            Block::default().style(Style::default().bg(theme.colors.bg_primary)),
            area,
        );

        let layout = LayoutManager::compute(area, state);

        frame.render_widget(Header::new(state, theme), layout.header);
        frame.render_widget(Footer::new(state, theme), layout.footer);

        // Dashboard
        if let Some(stats_area) = layout.stats {
            frame.render_widget(StatsCards::new(state, theme), stats_area);
        }
        if let Some(vehicles_area) = layout.vehicles {
            frame.render_widget(VehicleList::new(state, theme), vehicles_area);
        }
        if let Some(alerts_area) = layout.alerts {
            frame.render_widget(AlertsPanel::new(state, theme), alerts_area);
        }

        // Analytics
        if let Some(summary_area) = layout.fleet_summary {
            frame.render_widget(FleetSummary::new(state, theme), summary_area);
        }
        if let Some(trend_area) = layout.speed_trend {
            frame.render_widget(SpeedTrendChart::new(state, theme), trend_area);
        }
        if let Some(type_area) = layout.speed_by_type {
            frame.render_widget(SpeedByTypeChart::new(state, theme), type_area);
        }
        if let Some(vehicle_area) = layout.speed_by_vehicle {
            frame.render_widget(SpeedByVehicleChart::new(state, theme), vehicle_area);
        }
        if let Some(fuel_area) = layout.fuel_by_vehicle {
            frame.render_widget(FuelByVehicleChart::new(state, theme), fuel_area);
        }

        if let Some(overlay_area) = layout.overlay_area {
            match &state.mode {
                AppMode::Help => frame.render_widget(HelpOverlay::new(theme), overlay_area),
                AppMode::VehicleDetail { vehicle_id } => frame.render_widget(
                    VehicleDetail::new(vehicle_id, state.data.vehicle_detail.as_ref(), theme),
                    overlay_area,
                ),
                AppMode::Normal => {}
            }
        }

        Self::render_notifications(frame, state);
    }

    /// Stack the three newest notifications in the top-right corner
    fn render_notifications(frame: &mut Frame, state: &AppState) {
        let theme = &state.theme;
        let area = frame.area();

        let mut y = area.y + 2;
        for notification in state.notifications.iter().rev().take(3) {
            if y >= area.y + area.height {
                break;
            }

            let (icon, style) = match notification.level {
                NotificationLevel::Info => ("ℹ", theme.styles.notification_info),
                NotificationLevel::Success => ("✓", theme.styles.notification_success),
                NotificationLevel::Warning => ("⚠", theme.styles.notification_warning),
                NotificationLevel::Error => ("✗", theme.styles.notification_error),
            };

            let msg = format!(" {} {} ", icon, notification.message);
            let width = (msg.width() as u16)
                .min(MAX_NOTIFICATION_WIDTH)
                .min(area.width.saturating_sub(2));
            let notification_area = Rect {
                x: area.x + area.width.saturating_sub(width + 2),
                y,
                width,
                height: 1,
            };

            frame.render_widget(
                Paragraph::new(Span::styled(msg, style))
                    .style(Style::default().bg(theme.colors.bg_tertiary)),
                notification_area,
            );

            y += 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::QueryState;
    use crate::core::state::Screen;
    use crate::ui::theme::Theme;
    use ratatui::{backend::TestBackend, Terminal};

    fn state() -> AppState {
        AppState::new(Theme::default(), "production".into(), "https://fleet.example".into(), 7)
    }

    fn draw(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal
            .draw(|frame| Renderer::render(frame, state))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_dashboard_shows_loading_panels() {
        let text = draw(&state());
        assert!(text.contains("Loading vehicles"));
        assert!(text.contains("Loading alerts"));
    }

    #[test]
    fn test_analytics_screen_renders_charts() {
        let mut state = state();
        state.screen = Screen::Analytics;
        state.data.history = QueryState {
            is_loading: false,
            error: Some("503".into()),
            ..QueryState::default()
        };

        let text = draw(&state);
        assert!(text.contains("SPEED BY VEHICLE"));
        assert!(text.contains("Failed to load historical metrics"));
    }

    #[test]
    fn test_notifications_are_drawn() {
        let mut state = state();
        state.add_notification("Alert 4 acknowledged".into(), NotificationLevel::Success);

        assert!(draw(&state).contains("Alert 4 acknowledged"));
    }

    #[test]
    fn test_help_overlay_replaces_nothing_in_normal_mode() {
        let mut state = state();
        assert!(!draw(&state).contains("Fleetwatch Help"));
        state.mode = AppMode::Help;
        assert!(draw(&state).contains("Fleetwatch Help"));
    }
}
