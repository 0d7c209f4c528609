//! Layout management system

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::core::state::{AppState, Screen};

/// Computed layout rects for all panels
#[derive(Debug, Clone, Default)]
pub struct ComputedLayout {
    pub header: Rect,
    pub footer: Rect,
    // Dashboard
    pub stats: Option<Rect>,
    pub vehicles: Option<Rect>,
    pub alerts: Option<Rect>,
    // Analytics
    pub fleet_summary: Option<Rect>,
    pub speed_trend: Option<Rect>,
    pub speed_by_type: Option<Rect>,
    pub speed_by_vehicle: Option<Rect>,
    pub fuel_by_vehicle: Option<Rect>,
    pub overlay_area: Option<Rect>,
}

pub struct LayoutManager;

impl LayoutManager {
    pub fn compute(area: Rect, state: &AppState) -> ComputedLayout {
        let [header, body, footer] = Self::frame(area);
        let layout = ComputedLayout {
            header,
            footer,
            overlay_area: Some(Self::centered_rect(70, 70, area)),
            ..Default::default()
        };

        match state.screen {
            Screen::Dashboard => Self::dashboard_layout(body, layout),
            Screen::Analytics => Self::analytics_layout(body, layout),
        }
    }

    fn frame(area: Rect) -> [Rect; 3] {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(10),
                Constraint::Length(1),
            ])
            .split(area);
        [chunks[0], chunks[1], chunks[2]]
    }

    fn dashboard_layout(body: Rect, mut layout: ComputedLayout) -> ComputedLayout {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(6)])
            .split(body);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        layout.stats = Some(rows[0]);
        layout.vehicles = Some(columns[0]);
        layout.alerts = Some(columns[1]);
        layout
    }

    fn analytics_layout(body: Rect, mut layout: ComputedLayout) -> ComputedLayout {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Percentage(50),
                Constraint::Min(6),
            ])
            .split(body);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[2]);

        layout.fleet_summary = Some(rows[0]);
        layout.speed_trend = Some(middle[0]);
        layout.speed_by_type = Some(middle[1]);
        layout.speed_by_vehicle = Some(bottom[0]);
        layout.fuel_by_vehicle = Some(bottom[1]);
        layout
    }

    /// Create a centered rect with given percentage width/height
    pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(area);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::Theme;

    fn state(screen: Screen) -> AppState {
        let mut state = AppState::new(Theme::default(), "test".into(), "http://localhost".into(), 7);
        state.screen = screen;
        state
    }

    #[test]
    fn dashboard_has_only_dashboard_panels() {
        let layout = LayoutManager::compute(Rect::new(0, 0, 120, 40), &state(Screen::Dashboard));
        assert!(layout.vehicles.is_some());
        assert!(layout.alerts.is_some());
        assert!(layout.speed_trend.is_none());
        assert_eq!(layout.header.height, 1);
        assert_eq!(layout.footer.y, 39);
    }

    #[test]
    fn analytics_panels_fit_inside_body() {
        let area = Rect::new(0, 0, 120, 40);
        let layout = LayoutManager::compute(area, &state(Screen::Analytics));
        let fuel = layout.fuel_by_vehicle.unwrap();
        assert!(fuel.bottom() <= layout.footer.y);
        assert!(layout.vehicles.is_none());
    }
}
