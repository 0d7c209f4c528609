//! Fleet backend API client layer

pub mod client;
pub mod models;
pub mod paths;

use async_trait::async_trait;
use chrono::NaiveDate;

pub use client::FleetClient;
pub use models::{
    Alert, DailyFleetMetrics, DailyVehicleMetrics, FleetAnalytics, HistoricalMetricsResponse,
    VehicleFuelConsumption, VehicleStatus, VehicleTelemetry, VehicleType,
};
pub use paths::{AlertResource, ApiPaths, Resource};

/// Transport, HTTP and decoding failures from the backend
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Operations the dashboard needs from the backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FleetApi: Send + Sync {
    async fn active_alerts(&self) -> Result<Vec<Alert>, ApiError>;

    async fn acknowledge_alert(&self, alert_id: i64) -> Result<Alert, ApiError>;

    async fn resolve_alert(&self, alert_id: i64) -> Result<Alert, ApiError>;

    async fn fleet_analytics(&self) -> Result<FleetAnalytics, ApiError>;

    async fn historical_metrics(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HistoricalMetricsResponse, ApiError>;

    async fn latest_telemetry(&self) -> Result<Vec<VehicleTelemetry>, ApiError>;

    async fn vehicle_telemetry(&self, vehicle_id: &str) -> Result<Vec<VehicleTelemetry>, ApiError>;
}
