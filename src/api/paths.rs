//! Logical resource names and their URL mapping
//!
//! Call sites name a [`Resource`]; only [`ApiPaths`] knows how that maps
//! onto the deployment (base URL, optional path prefix, alert naming).

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::ApiError;

/// Which naming the alert endpoints use in this deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertResource {
    #[default]
    Alerts,
    Notifications,
}

impl AlertResource {
    pub fn segment(self) -> &'static str {
        match self {
            Self::Alerts => "alerts",
            Self::Notifications => "notifications",
        }
    }
}

/// Every backend resource the dashboard reads or mutates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    ActiveAlerts,
    AcknowledgeAlert(i64),
    ResolveAlert(i64),
    FleetAnalytics,
    HistoricalMetrics,
    LatestTelemetry,
    VehicleTelemetry(String),
}

impl Resource {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActiveAlerts => "alerts.active",
            Self::AcknowledgeAlert(_) => "alerts.acknowledge",
            Self::ResolveAlert(_) => "alerts.resolve",
            Self::FleetAnalytics => "analytics.fleet",
            Self::HistoricalMetrics => "analytics.history",
            Self::LatestTelemetry => "analytics.telemetry.latest",
            Self::VehicleTelemetry(_) => "analytics.vehicle",
        }
    }

    fn segments(&self, alerts: AlertResource) -> Vec<String> {
        let alerts = alerts.segment().to_string();
        match self {
            Self::ActiveAlerts => vec![alerts, "active".into()],
            Self::AcknowledgeAlert(id) => vec![alerts, id.to_string(), "acknowledge".into()],
            Self::ResolveAlert(id) => vec![alerts, id.to_string(), "resolve".into()],
            Self::FleetAnalytics => vec!["analytics".into(), "fleet".into()],
            Self::HistoricalMetrics => vec!["analytics".into(), "history".into()],
            Self::LatestTelemetry => {
                vec!["analytics".into(), "telemetry".into(), "latest".into()]
            }
            Self::VehicleTelemetry(vehicle_id) => {
                vec!["analytics".into(), "vehicles".into(), vehicle_id.clone()]
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiPaths {
    base: Url,
    prefix: Vec<String>,
    alerts: AlertResource,
}

impl ApiPaths {
    pub fn new(base_url: &str, prefix: &str, alerts: AlertResource) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let prefix = prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            base,
            prefix,
            alerts,
        })
    }

    pub fn url(&self, resource: &Resource) -> Url {
        let mut url = self.base.clone();
        {
            // Checked in `new`, so the base always has path segments
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty();
                segments.extend(&self.prefix);
                segments.extend(resource.segments(self.alerts));
            }
        }
        url
    }
}
