//! Application state shared between the event loop and the renderer

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::api::{Alert, FleetAnalytics, HistoricalMetricsResponse, VehicleTelemetry};
use crate::core::charts::default_history_range;
use crate::core::metrics::{filter_by_status, StatusFilter};
use crate::core::query::QueryState;
use crate::ui::theme::Theme;

/// Top-level screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Dashboard,
    Analytics,
}

impl Screen {
    pub fn toggle(self) -> Self {
        match self {
            Self::Dashboard => Self::Analytics,
            Self::Analytics => Self::Dashboard,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Analytics => "Analytics",
        }
    }
}

/// Overlay mode on top of the current screen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppMode {
    #[default]
    Normal,
    Help,
    VehicleDetail { vehicle_id: String },
}

/// Which dashboard panel has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusedPanel {
    #[default]
    Vehicles,
    Alerts,
}

impl FocusedPanel {
    pub fn next(self) -> Self {
        match self {
            Self::Vehicles => Self::Alerts,
            Self::Alerts => Self::Vehicles,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VehiclePanelState {
    pub selected_index: usize,
    pub filter: StatusFilter,
}

#[derive(Debug, Clone, Default)]
pub struct AlertPanelState {
    pub selected_index: usize,
}

/// Latest snapshot of every mounted query
#[derive(Debug, Clone, Default)]
pub struct DataSnapshots {
    pub alerts: QueryState<Vec<Alert>>,
    pub vehicles: QueryState<Vec<VehicleTelemetry>>,
    pub fleet: QueryState<FleetAnalytics>,
    pub history: QueryState<HistoricalMetricsResponse>,
    pub vehicle_detail: Option<QueryState<Vec<VehicleTelemetry>>>,
}

impl DataSnapshots {
    pub fn alerts(&self) -> &[Alert] {
        self.alerts.data.as_deref().unwrap_or_default()
    }

    pub fn vehicles(&self) -> &[VehicleTelemetry] {
        self.vehicles.data.as_deref().unwrap_or_default()
    }
}

const RANGE_STEPS: [u32; 5] = [1, 7, 14, 30, 90];

/// Date window shown on the analytics screen, ending today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRange {
    pub days: u32,
    pub to: NaiveDate,
}

impl HistoryRange {
    pub fn new(days: u32, today: NaiveDate) -> Self {
        Self {
            days: days.max(1),
            to: today,
        }
    }

    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        default_history_range(self.to, self.days)
    }

    pub fn grow(&mut self) -> bool {
        match RANGE_STEPS.iter().find(|d| **d > self.days) {
            Some(days) => {
                self.days = *days;
                true
            }
            None => false,
        }
    }

    pub fn shrink(&mut self) -> bool {
        match RANGE_STEPS.iter().rev().find(|d| **d < self.days) {
            Some(days) => {
                self.days = *days;
                true
            }
            None => false,
        }
    }
}

/// Notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub mode: AppMode,
    pub focus_panel: FocusedPanel,
    pub vehicles_panel: VehiclePanelState,
    pub alerts_panel: AlertPanelState,
    pub data: DataSnapshots,
    pub history_range: HistoryRange,
    pub theme: Theme,
    pub notifications: Vec<Notification>,
    pub environment: String,
    /// Highlights the environment badge in the header
    pub production: bool,
    pub base_url: String,
    pub actions_busy: bool,
    pub terminal_size: (u16, u16),
}

impl AppState {
    pub fn new(theme: Theme, environment: String, base_url: String, history_days: u32) -> Self {
        Self {
            screen: Screen::Dashboard,
            mode: AppMode::Normal,
            focus_panel: FocusedPanel::Vehicles,
            vehicles_panel: VehiclePanelState::default(),
            alerts_panel: AlertPanelState::default(),
            data: DataSnapshots::default(),
            history_range: HistoryRange::new(history_days, Utc::now().date_naive()),
            theme,
            notifications: Vec::new(),
            environment,
            production: false,
            base_url,
            actions_busy: false,
            terminal_size: (80, 24),
        }
    }

    /// Vehicles left after the status filter
    pub fn visible_vehicles(&self) -> Vec<&VehicleTelemetry> {
        filter_by_status(self.data.vehicles(), self.vehicles_panel.filter)
    }

    pub fn selected_vehicle(&self) -> Option<&VehicleTelemetry> {
        self.visible_vehicles()
            .get(self.vehicles_panel.selected_index)
            .copied()
    }

    pub fn selected_alert(&self) -> Option<&Alert> {
        self.data.alerts().get(self.alerts_panel.selected_index)
    }

    /// Move the selection in the focused panel, staying within bounds
    pub fn move_selection(&mut self, delta: isize) {
        let (index, len) = match self.focus_panel {
            FocusedPanel::Vehicles => (
                &mut self.vehicles_panel.selected_index,
                filter_by_status(self.data.vehicles(), self.vehicles_panel.filter).len(),
            ),
            FocusedPanel::Alerts => (&mut self.alerts_panel.selected_index, self.data.alerts().len()),
        };
        *index = index
            .saturating_add_signed(delta)
            .min(len.saturating_sub(1));
    }

    pub fn cycle_filter(&mut self) -> StatusFilter {
        self.vehicles_panel.filter = self.vehicles_panel.filter.cycle();
        self.vehicles_panel.selected_index = 0;
        self.vehicles_panel.filter
    }

    /// Keep selections valid after the underlying lists change
    pub fn clamp_selections(&mut self) {
        let vehicles = self.visible_vehicles().len();
        let alerts = self.data.alerts().len();
        self.vehicles_panel.selected_index = self
            .vehicles_panel
            .selected_index
            .min(vehicles.saturating_sub(1));
        self.alerts_panel.selected_index =
            self.alerts_panel.selected_index.min(alerts.saturating_sub(1));
    }

    pub fn add_notification(&mut self, message: String, level: NotificationLevel) {
        self.notifications.push(Notification {
            message,
            level,
            created_at: Utc::now(),
            duration_ms: 5000,
        });
    }

    pub fn remove_expired_notifications(&mut self) {
        let now = Utc::now();
        self.notifications.retain(|n| {
            let elapsed = now.signed_duration_since(n.created_at).num_milliseconds() as u64;
            elapsed < n.duration_ms
        });
    }
}

/// Thread-safe state store
#[derive(Clone)]
pub struct StateStore {
    state: Arc<RwLock<AppState>>,
}

impl StateStore {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
        }
    }

    /// Atomic state mutation
    pub fn update<F, R>(&self, mutator: F) -> R
    where
        F: FnOnce(&mut AppState) -> R,
    {
        mutator(&mut self.state.write())
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.update(|s| s.add_notification(message.into(), level));
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, AppState> {
        self.state.read()
    }

    pub fn snapshot(&self) -> AppState {
        self.state.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::AlertType;
    use crate::api::VehicleStatus;
    use crate::core::metrics::fixtures::{alert, vehicle};
    use pretty_assertions::assert_eq;

    fn state_with_data() -> AppState {
        let mut state = AppState::new(
            Theme::default(),
            "development".into(),
            "http://localhost:8080".into(),
            7,
        );
        state.data.vehicles.data = Some(vec![
            vehicle("A", VehicleStatus::Idle, 0.0, 90.0),
            vehicle("B", VehicleStatus::EnRoute, 50.0, 60.0),
            vehicle("C", VehicleStatus::EnRoute, 45.0, 30.0),
        ]);
        state.data.alerts.data = Some(vec![alert(1, AlertType::LowFuel)]);
        state
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut state = state_with_data();
        state.move_selection(-1);
        assert_eq!(state.vehicles_panel.selected_index, 0);
        state.move_selection(10);
        assert_eq!(state.vehicles_panel.selected_index, 2);

        state.focus_panel = state.focus_panel.next();
        state.move_selection(1);
        assert_eq!(state.alerts_panel.selected_index, 0);
        assert_eq!(state.selected_alert().map(|a| a.id), Some(1));
    }

    #[test]
    fn filter_applies_to_selection() {
        let mut state = state_with_data();
        state.vehicles_panel.selected_index = 2;
        assert_eq!(
            state.cycle_filter(),
            StatusFilter::Only(VehicleStatus::EnRoute)
        );
        assert_eq!(state.vehicles_panel.selected_index, 0);
        assert_eq!(state.visible_vehicles().len(), 2);
        assert_eq!(state.selected_vehicle().map(|v| v.vehicle_id.as_str()), Some("B"));
    }

    #[test]
    fn clamps_selection_when_list_shrinks() {
        let mut state = state_with_data();
        state.vehicles_panel.selected_index = 2;
        state.data.vehicles.data = Some(Vec::new());
        state.clamp_selections();
        assert_eq!(state.vehicles_panel.selected_index, 0);
        assert!(state.selected_vehicle().is_none());
    }

    #[test]
    fn history_range_steps() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 28).unwrap();
        let mut range = HistoryRange::new(7, today);
        assert!(range.grow());
        assert_eq!(range.days, 14);
        assert!(range.shrink());
        assert!(range.shrink());
        assert_eq!(range.days, 1);
        assert!(!range.shrink());
        assert_eq!(
            range.bounds(),
            (NaiveDate::from_ymd_opt(2025, 12, 27).unwrap(), today)
        );
    }

    #[test]
    fn store_clones_share_state() {
        let store = StateStore::new(state_with_data());
        let handle = store.clone();

        let screen = handle.update(|s| {
            s.screen = s.screen.toggle();
            s.screen
        });
        store.notify(NotificationLevel::Success, "Alert acknowledged");

        assert_eq!(screen, Screen::Analytics);
        assert_eq!(store.read().screen, Screen::Analytics);
        assert_eq!(handle.snapshot().notifications.len(), 1);
    }

    #[test]
    fn expired_notifications_are_dropped() {
        let mut state = state_with_data();
        state.add_notification("stale".into(), NotificationLevel::Info);
        state.notifications[0].created_at = Utc::now() - chrono::Duration::seconds(10);
        state.add_notification("fresh".into(), NotificationLevel::Info);
        state.remove_expired_notifications();
        assert_eq!(state.notifications.len(), 1);
        assert_eq!(state.notifications[0].message, "fresh");
    }
}
