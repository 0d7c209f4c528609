//! Main application orchestrator

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::Stdout;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::{Alert, FleetAnalytics, FleetApi, HistoricalMetricsResponse, VehicleTelemetry};
use crate::config::Config;
use crate::core::events::{AlertAction, Event, EventHandler, EventResult, KeyBindings};
use crate::core::queries::{AlertActions, FleetQueries};
use crate::core::query::{PollingQuery, QueryClient};
use crate::core::state::{
    AppMode, AppState, DataSnapshots, FocusedPanel, HistoryRange, NotificationLevel, Screen,
    StateStore,
};
use crate::ui::renderer::Renderer;
use crate::ui::theme::Theme;

struct DashboardQueries {
    alerts: PollingQuery<Vec<Alert>>,
    vehicles: PollingQuery<Vec<VehicleTelemetry>>,
}

struct AnalyticsQueries {
    fleet: PollingQuery<FleetAnalytics>,
    history: PollingQuery<HistoricalMetricsResponse>,
}

/// Queries mounted for the visible screen. Replacing a screen drops its
/// handles, which stops their polling.
pub struct ScreenQueries {
    queries: FleetQueries,
    dashboard: Option<DashboardQueries>,
    analytics: Option<AnalyticsQueries>,
    detail: Option<PollingQuery<Vec<VehicleTelemetry>>>,
}

impl ScreenQueries {
    pub fn new(queries: FleetQueries) -> Self {
        Self {
            queries,
            dashboard: None,
            analytics: None,
            detail: None,
        }
    }

    pub fn mount(&mut self, screen: Screen, range: HistoryRange) {
        match screen {
            Screen::Dashboard => {
                self.analytics = None;
                if self.dashboard.is_none() {
                    self.dashboard = Some(DashboardQueries {
                        alerts: self.queries.alerts(),
                        vehicles: self.queries.vehicles(),
                    });
                }
            }
            Screen::Analytics => {
                self.dashboard = None;
                self.detail = None;
                let (from, to) = range.bounds();
                self.analytics = Some(AnalyticsQueries {
                    fleet: self.queries.fleet_analytics(),
                    history: self.queries.historical_metrics(from, to),
                });
            }
        }
        tracing::debug!(?screen, live = self.queries.client().live_queries(), "screen mounted");
    }

    /// Swap the history query for a new range, keeping the fleet query
    pub fn remount_history(&mut self, range: HistoryRange) {
        if let Some(analytics) = self.analytics.as_mut() {
            let (from, to) = range.bounds();
            analytics.history = self.queries.historical_metrics(from, to);
        }
    }

    pub fn open_detail(&mut self, vehicle_id: &str) {
        self.detail = Some(self.queries.vehicle_telemetry(vehicle_id));
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn refetch_all(&self) -> usize {
        self.queries.client().invalidate_all()
    }

    /// Refetch only the open vehicle overlay
    pub fn refetch_detail(&self) -> bool {
        match &self.detail {
            Some(detail) => {
                detail.refetch();
                true
            }
            None => false,
        }
    }

    /// Copy the latest snapshot of every mounted query into `data`
    pub fn sync(&self, data: &mut DataSnapshots) {
        if let Some(dashboard) = &self.dashboard {
            data.alerts = dashboard.alerts.snapshot();
            data.vehicles = dashboard.vehicles.snapshot();
        }
        if let Some(analytics) = &self.analytics {
            data.fleet = analytics.fleet.snapshot();
            data.history = analytics.history.snapshot();
        }
        data.vehicle_detail = self.detail.as_ref().map(|q| q.snapshot());
    }
}

pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: StateStore,
    event_tx: mpsc::UnboundedSender<Event>,
    mounted: ScreenQueries,
    actions: AlertActions,
}

impl App {
    pub fn new(config: &Config, api: Arc<dyn FleetApi>) -> Result<Self> {
        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;

        let theme = Theme::from_name(&config.display.theme);
        let mut initial_state = AppState::new(
            theme,
            config.api.environment.clone().unwrap_or_default(),
            config.api.base_url.clone().unwrap_or_default(),
            config.display.history_days,
        );
        initial_state.production = config.is_production();
        let state = StateStore::new(initial_state);

        // Replaced in run() once the event handler exists
        let (event_tx, _) = mpsc::unbounded_channel::<Event>();

        let queries = FleetQueries::new(api, QueryClient::new(), config.polling.clone());
        let actions = queries.alert_actions();

        Ok(Self {
            terminal,
            state,
            event_tx,
            mounted: ScreenQueries::new(queries),
            actions,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.setup_terminal()?;

        let (mut event_handler, event_tx) = EventHandler::new();
        self.event_tx = event_tx.clone();
        EventHandler::spawn_sources(event_tx);

        let (screen, range) = {
            let state = self.state.read();
            (state.screen, state.history_range)
        };
        self.mounted.mount(screen, range);

        self.render()?;

        let result = self.event_loop(&mut event_handler).await;

        self.shutdown()?;
        result
    }

    fn setup_terminal(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide,
        )?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show,
        )?;
        Ok(())
    }

    async fn event_loop(&mut self, event_handler: &mut EventHandler) -> Result<()> {
        while let Some(event) = event_handler.next().await {
            if self.handle_event(event)? == EventResult::Quit {
                break;
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<EventResult> {
        match event {
            Event::Key(key) => {
                let result = self.handle_key(key);
                self.sync_and_render()?;
                Ok(result)
            }
            Event::Resize(w, h) => {
                self.state.update(|s| s.terminal_size = (w, h));
                self.render()?;
                Ok(EventResult::Continue)
            }
            Event::Tick => {
                self.sync_and_render()?;
                Ok(EventResult::Continue)
            }
            Event::SlowTick => {
                self.state.update(|s| s.remove_expired_notifications());
                Ok(EventResult::Continue)
            }
            Event::AlertActionSettled {
                action,
                alert_id,
                error,
            } => {
                match error {
                    None => self.state.notify(
                        NotificationLevel::Success,
                        format!("Alert #{} {}", alert_id, action.past_tense()),
                    ),
                    Some(e) => self.state.notify(
                        NotificationLevel::Error,
                        format!("Alert #{} not {}: {}", alert_id, action.past_tense(), e),
                    ),
                }
                self.sync_and_render()?;
                Ok(EventResult::Continue)
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult {
        if KeyBindings::quit_alt().matches(&key) {
            return EventResult::Quit;
        }

        let mode = self.state.read().mode.clone();
        match mode {
            AppMode::Normal => self.handle_normal_key(key),
            AppMode::Help => {
                if KeyBindings::escape().matches(&key)
                    || KeyBindings::help().matches(&key)
                    || KeyBindings::quit().matches(&key)
                {
                    self.set_mode(AppMode::Normal);
                }
                EventResult::Continue
            }
            AppMode::VehicleDetail { .. } => {
                if KeyBindings::escape().matches(&key) || KeyBindings::quit().matches(&key) {
                    self.mounted.close_detail();
                    self.set_mode(AppMode::Normal);
                } else if KeyBindings::refresh().matches(&key) {
                    self.mounted.refetch_detail();
                }
                EventResult::Continue
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> EventResult {
        if KeyBindings::quit().matches(&key) {
            return EventResult::Quit;
        }

        if KeyBindings::help().matches(&key) {
            self.set_mode(AppMode::Help);
        } else if KeyBindings::switch_screen().matches(&key) {
            self.switch_screen();
        } else if KeyBindings::refresh().matches(&key) {
            let woken = self.mounted.refetch_all();
            tracing::info!(woken, "manual refresh");
            self.state
                .notify(NotificationLevel::Info, format!("Refreshing {} queries", woken));
        } else {
            let screen = self.state.read().screen;
            match screen {
                Screen::Dashboard => self.handle_dashboard_key(key),
                Screen::Analytics => self.handle_analytics_key(key),
            }
        }
        EventResult::Continue
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        if KeyBindings::left().matches(&key) || KeyBindings::right().matches(&key) {
            self.state.update(|s| s.focus_panel = s.focus_panel.next());
        } else if KeyBindings::up().matches(&key) || KeyBindings::vim_up().matches(&key) {
            self.state.update(|s| s.move_selection(-1));
        } else if KeyBindings::down().matches(&key) || KeyBindings::vim_down().matches(&key) {
            self.state.update(|s| s.move_selection(1));
        } else if KeyBindings::cycle_filter().matches(&key) {
            let filter = self.state.update(|s| s.cycle_filter());
            tracing::debug!(?filter, "vehicle filter changed");
        } else if KeyBindings::acknowledge().matches(&key) {
            self.run_alert_action(AlertAction::Acknowledge);
        } else if KeyBindings::resolve().matches(&key) {
            self.run_alert_action(AlertAction::Resolve);
        } else if KeyBindings::enter().matches(&key) {
            self.open_vehicle_detail();
        }
    }

    fn handle_analytics_key(&mut self, key: KeyEvent) {
        let grow = KeyBindings::grow_range().matches(&key);
        if !grow && !KeyBindings::shrink_range().matches(&key) {
            return;
        }

        let changed = self.state.update(|s| {
            let changed = if grow {
                s.history_range.grow()
            } else {
                s.history_range.shrink()
            };
            changed.then_some(s.history_range)
        });

        if let Some(range) = changed {
            tracing::debug!(days = range.days, "history range changed");
            self.mounted.remount_history(range);
        }
    }

    fn switch_screen(&mut self) {
        let (screen, range) = self.state.update(|s| {
            s.screen = s.screen.toggle();
            s.mode = AppMode::Normal;
            (s.screen, s.history_range)
        });
        self.mounted.mount(screen, range);
    }

    fn set_mode(&mut self, mode: AppMode) {
        self.state.update(|s| s.mode = mode);
    }

    fn open_vehicle_detail(&mut self) {
        let selected = {
            let state = self.state.read();
            if state.focus_panel != FocusedPanel::Vehicles {
                return;
            }
            state.selected_vehicle().map(|v| v.vehicle_id.clone())
        };

        if let Some(vehicle_id) = selected {
            self.mounted.open_detail(&vehicle_id);
            self.set_mode(AppMode::VehicleDetail { vehicle_id });
        }
    }

    /// Spawn the mutation so the UI keeps rendering while it is in flight
    fn run_alert_action(&mut self, action: AlertAction) {
        if self.actions.is_busy() {
            self.state
                .notify(NotificationLevel::Warning, "An alert update is already in progress");
            return;
        }

        let alert_id = {
            let state = self.state.read();
            if state.focus_panel != FocusedPanel::Alerts {
                return;
            }
            match state.selected_alert() {
                Some(alert) => alert.id,
                None => return,
            }
        };

        // Counted as busy from here, before the task is first polled
        let Some(request) = self.actions.start(action, alert_id) else {
            return;
        };
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let error = request.await.err().map(|e| e.to_string());
            let _ = event_tx.send(Event::AlertActionSettled {
                action,
                alert_id,
                error,
            });
        });
    }

    fn sync_and_render(&mut self) -> Result<()> {
        let busy = self.actions.is_busy();
        self.state.update(|s| {
            self.mounted.sync(&mut s.data);
            s.actions_busy = busy;
            s.clamp_selections();
        });
        self.render()
    }

    fn render(&mut self) -> Result<()> {
        let state = self.state.snapshot();
        self.terminal.draw(|frame| {
            Renderer::render(frame, &state);
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockFleetApi;
    use crate::config::PollingConfig;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn mock_api() -> MockFleetApi {
        let mut api = MockFleetApi::new();
        api.expect_active_alerts().returning(|| Ok(Vec::new()));
        api.expect_latest_telemetry().returning(|| Ok(Vec::new()));
        api.expect_fleet_analytics()
            .returning(|| Ok(FleetAnalytics::default()));
        api.expect_historical_metrics().returning(|from, to| {
            Ok(HistoricalMetricsResponse {
                from_date: from,
                to_date: to,
                total_days: 0,
                days_with_data: None,
                average_fleet_speed: None,
                total_fuel_consumed: None,
                total_data_points: 0,
                daily_fleet_metrics: Vec::new(),
                daily_vehicle_metrics: Vec::new(),
                vehicle_fuel_consumption: Vec::new(),
            })
        });
        api.expect_vehicle_telemetry().returning(|_| Ok(Vec::new()));
        api
    }

    fn range() -> HistoryRange {
        HistoryRange::new(7, NaiveDate::from_ymd_opt(2025, 12, 28).unwrap())
    }

    #[tokio::test]
    async fn switching_screens_unmounts_previous_queries() {
        let client = QueryClient::new();
        let queries = FleetQueries::new(Arc::new(mock_api()), client.clone(), PollingConfig::default());
        let mut mounted = ScreenQueries::new(queries);

        mounted.mount(Screen::Dashboard, range());
        mounted.open_detail("FIRE-001");
        assert_eq!(client.live_queries(), 3);

        mounted.mount(Screen::Analytics, range());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(client.live_queries(), 2);
        assert!(mounted.detail.is_none());
    }

    #[tokio::test]
    async fn sync_copies_mounted_snapshots() {
        let queries = FleetQueries::new(Arc::new(mock_api()), QueryClient::new(), PollingConfig::default());
        let mut mounted = ScreenQueries::new(queries);
        mounted.mount(Screen::Analytics, range());

        let mut data = DataSnapshots::default();
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                mounted.sync(&mut data);
                if !data.history.is_loading && !data.fleet.is_loading {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("analytics queries never settled");

        let (from, _) = range().bounds();
        assert_eq!(data.history.data.as_ref().map(|h| h.from_date), Some(from));
        assert!(data.alerts.is_loading);
        assert!(data.vehicle_detail.is_none());
    }

    #[tokio::test]
    async fn detail_refresh_only_refetches_the_overlay() {
        let mut mounted = ScreenQueries::new(FleetQueries::new(
            Arc::new(mock_api()),
            QueryClient::new(),
            PollingConfig::default(),
        ));
        assert!(!mounted.refetch_detail());

        mounted.mount(Screen::Dashboard, range());
        mounted.open_detail("AMB-001");

        let mut data = DataSnapshots::default();
        let settle = |mounted: &ScreenQueries, data: &mut DataSnapshots, detail_fetches: u64| {
            mounted.sync(data);
            data.alerts.fetch_count >= 1
                && data
                    .vehicle_detail
                    .as_ref()
                    .is_some_and(|d| d.fetch_count >= detail_fetches)
        };

        tokio::time::timeout(Duration::from_secs(2), async {
            while !settle(&mounted, &mut data, 1) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("detail never loaded");

        assert!(mounted.refetch_detail());
        tokio::time::timeout(Duration::from_secs(2), async {
            while !settle(&mounted, &mut data, 2) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("detail was not refetched");

        assert_eq!(data.alerts.fetch_count, 1);
    }
}
