//! Fleet queries bound to the backend API

use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;

use super::events::AlertAction;
use super::query::{Mutation, PendingTracker, PollingQuery, QueryClient, QueryKey};
use crate::api::{
    Alert, ApiError, FleetAnalytics, FleetApi, HistoricalMetricsResponse, VehicleTelemetry,
};
use crate::config::PollingConfig;

/// Builds the polling queries and mutations the screens mount
#[derive(Clone)]
pub struct FleetQueries {
    api: Arc<dyn FleetApi>,
    client: QueryClient,
    polling: PollingConfig,
}

impl FleetQueries {
    pub fn new(api: Arc<dyn FleetApi>, client: QueryClient, polling: PollingConfig) -> Self {
        Self {
            api,
            client,
            polling,
        }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn alerts(&self) -> PollingQuery<Vec<Alert>> {
        let api = Arc::clone(&self.api);
        PollingQuery::spawn(&self.client, QueryKey::Alerts, Some(self.polling.alerts()), move || {
            let api = Arc::clone(&api);
            async move { api.active_alerts().await }
        })
    }

    pub fn vehicles(&self) -> PollingQuery<Vec<VehicleTelemetry>> {
        let api = Arc::clone(&self.api);
        PollingQuery::spawn(
            &self.client,
            QueryKey::Vehicles,
            Some(self.polling.vehicles()),
            move || {
                let api = Arc::clone(&api);
                async move { api.latest_telemetry().await }
            },
        )
    }

    pub fn fleet_analytics(&self) -> PollingQuery<FleetAnalytics> {
        let api = Arc::clone(&self.api);
        PollingQuery::spawn(
            &self.client,
            QueryKey::FleetAnalytics,
            Some(self.polling.fleet()),
            move || {
                let api = Arc::clone(&api);
                async move { api.fleet_analytics().await }
            },
        )
    }

    /// History only refetches on demand
    pub fn historical_metrics(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PollingQuery<HistoricalMetricsResponse> {
        let api = Arc::clone(&self.api);
        PollingQuery::spawn(
            &self.client,
            QueryKey::HistoricalMetrics { from, to },
            None,
            move || {
                let api = Arc::clone(&api);
                async move { api.historical_metrics(from, to).await }
            },
        )
    }

    pub fn vehicle_telemetry(&self, vehicle_id: &str) -> PollingQuery<Vec<VehicleTelemetry>> {
        let api = Arc::clone(&self.api);
        let id = vehicle_id.to_string();
        PollingQuery::spawn(
            &self.client,
            QueryKey::VehicleTelemetry {
                vehicle_id: id.clone(),
            },
            Some(self.polling.vehicle_detail()),
            move || {
                let api = Arc::clone(&api);
                let id = id.clone();
                async move { api.vehicle_telemetry(&id).await }
            },
        )
    }

    pub fn alert_actions(&self) -> AlertActions {
        AlertActions::new(Arc::clone(&self.api), &self.client)
    }
}

/// Acknowledge and resolve, sharing one in-flight tracker
#[derive(Clone)]
pub struct AlertActions {
    pub acknowledge: Mutation<i64, Alert>,
    pub resolve: Mutation<i64, Alert>,
    pending: PendingTracker,
}

impl AlertActions {
    pub fn new(api: Arc<dyn FleetApi>, client: &QueryClient) -> Self {
        let pending = PendingTracker::default();

        let ack_api = Arc::clone(&api);
        let acknowledge = Mutation::new(
            "acknowledge",
            client,
            &pending,
            QueryKey::Alerts,
            move |id: i64| {
                let api = Arc::clone(&ack_api);
                async move { api.acknowledge_alert(id).await }
            },
        );

        let resolve = Mutation::new("resolve", client, &pending, QueryKey::Alerts, move |id: i64| {
            let api = Arc::clone(&api);
            async move { api.resolve_alert(id).await }
        });

        Self {
            acknowledge,
            resolve,
            pending,
        }
    }

    /// True while either mutation is in flight
    pub fn is_busy(&self) -> bool {
        self.pending.is_busy()
    }

    /// Start an action unless one is already in flight. The returned request
    /// counts as busy before it is first polled.
    pub fn start(
        &self,
        action: AlertAction,
        alert_id: i64,
    ) -> Option<impl Future<Output = Result<Alert, ApiError>> + Send + 'static> {
        if self.is_busy() {
            return None;
        }
        let mutation = match action {
            AlertAction::Acknowledge => &self.acknowledge,
            AlertAction::Resolve => &self.resolve,
        };
        Some(mutation.start(alert_id))
    }
}
