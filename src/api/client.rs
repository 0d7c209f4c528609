//! reqwest-backed implementation of [`FleetApi`]

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::models::normalize_list;
use super::{
    Alert, ApiError, ApiPaths, FleetAnalytics, FleetApi, HistoricalMetricsResponse, Resource,
    VehicleTelemetry,
};
use crate::config::ApiConfig;

pub struct FleetClient {
    http: reqwest::Client,
    paths: ApiPaths,
}

impl FleetClient {
    pub fn new(paths: ApiPaths, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fleetwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Transport {
                url: String::new(),
                source,
            })?;

        Ok(Self { http, paths })
    }

    /// Build a client from a validated API configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.as_deref().unwrap_or_default();
        let paths = ApiPaths::new(base_url, &config.path_prefix, config.alert_resource)?;
        Self::new(paths, Duration::from_secs(config.timeout_secs))
    }

    async fn send(
        &self,
        method: Method,
        resource: &Resource,
        query: &[(&str, String)],
    ) -> Result<(Url, Value), ApiError> {
        let url = self.paths.url(resource);
        tracing::debug!(%method, %url, resource = resource.name(), "api request");

        let response = self
            .http
            .request(method.clone(), url.clone())
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        tracing::debug!(%method, %url, %status, "api response");
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response.bytes().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        // An empty body decodes as null so list endpoints normalize to empty
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
                url: url.to_string(),
                source,
            })?
        };

        Ok((url, value))
    }

    async fn fetch_one<T: DeserializeOwned>(
        &self,
        method: Method,
        resource: Resource,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let (url, value) = self.send(method, &resource, query).await?;
        serde_json::from_value(value).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn fetch_list<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>, ApiError> {
        let (url, value) = self.send(Method::GET, &resource, &[]).await?;
        normalize_list(value).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl FleetApi for FleetClient {
    async fn active_alerts(&self) -> Result<Vec<Alert>, ApiError> {
        self.fetch_list(Resource::ActiveAlerts).await
    }

    async fn acknowledge_alert(&self, alert_id: i64) -> Result<Alert, ApiError> {
        self.fetch_one(Method::PATCH, Resource::AcknowledgeAlert(alert_id), &[])
            .await
    }

    async fn resolve_alert(&self, alert_id: i64) -> Result<Alert, ApiError> {
        self.fetch_one(Method::PATCH, Resource::ResolveAlert(alert_id), &[])
            .await
    }

    async fn fleet_analytics(&self) -> Result<FleetAnalytics, ApiError> {
        self.fetch_one(Method::GET, Resource::FleetAnalytics, &[]).await
    }

    async fn historical_metrics(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HistoricalMetricsResponse, ApiError> {
        let query = [
            ("from", from.format("%Y-%m-%d").to_string()),
            ("to", to.format("%Y-%m-%d").to_string()),
        ];
        self.fetch_one(Method::GET, Resource::HistoricalMetrics, &query)
            .await
    }

    async fn latest_telemetry(&self) -> Result<Vec<VehicleTelemetry>, ApiError> {
        self.fetch_list(Resource::LatestTelemetry).await
    }

    async fn vehicle_telemetry(&self, vehicle_id: &str) -> Result<Vec<VehicleTelemetry>, ApiError> {
        self.fetch_list(Resource::VehicleTelemetry(vehicle_id.to_string()))
            .await
    }
}
