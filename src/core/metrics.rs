//! Derived dashboard metrics
//!
//! Everything here is a pure function of the latest query snapshots and is
//! recomputed on every render.

use std::collections::BTreeMap;
use std::fmt;

use crate::api::{Alert, VehicleStatus, VehicleTelemetry};

/// Vehicle count per status. All four statuses are always present.
pub fn status_counts(vehicles: &[VehicleTelemetry]) -> BTreeMap<VehicleStatus, usize> {
    let mut counts: BTreeMap<VehicleStatus, usize> =
        VehicleStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for vehicle in vehicles {
        *counts.entry(vehicle.vehicle_status).or_default() += 1;
    }
    counts
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertSplit {
    pub critical: usize,
    pub warning: usize,
    pub total: usize,
}

pub fn alert_split(alerts: &[Alert]) -> AlertSplit {
    let critical = alerts.iter().filter(|a| a.is_critical()).count();
    AlertSplit {
        critical,
        warning: alerts.len() - critical,
        total: alerts.len(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FleetAverages {
    pub speed: f64,
    pub fuel_level: f64,
}

pub fn fleet_averages(vehicles: &[VehicleTelemetry]) -> FleetAverages {
    if vehicles.is_empty() {
        return FleetAverages::default();
    }
    let n = vehicles.len() as f64;
    FleetAverages {
        speed: vehicles.iter().map(|v| v.speed).sum::<f64>() / n,
        fuel_level: vehicles.iter().map(|v| v.fuel_level).sum::<f64>() / n,
    }
}

/// Figures shown in the dashboard stat cards
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub available: usize,
    pub total_vehicles: usize,
    pub alerts: AlertSplit,
    pub averages: FleetAverages,
    pub by_status: BTreeMap<VehicleStatus, usize>,
}

impl DashboardStats {
    pub fn compute(vehicles: &[VehicleTelemetry], alerts: &[Alert]) -> Self {
        let by_status = status_counts(vehicles);
        Self {
            available: by_status.get(&VehicleStatus::Idle).copied().unwrap_or(0),
            total_vehicles: vehicles.len(),
            alerts: alert_split(alerts),
            averages: fleet_averages(vehicles),
            by_status,
        }
    }
}

/// Client-side filter for the vehicle list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(VehicleStatus),
}

impl StatusFilter {
    /// Step through the filter options in dropdown order
    pub fn cycle(self) -> Self {
        match self {
            Self::All => Self::Only(VehicleStatus::EnRoute),
            Self::Only(VehicleStatus::EnRoute) => Self::Only(VehicleStatus::OnScene),
            Self::Only(VehicleStatus::OnScene) => Self::Only(VehicleStatus::Returning),
            Self::Only(VehicleStatus::Returning) => Self::Only(VehicleStatus::Idle),
            Self::Only(VehicleStatus::Idle) => Self::All,
        }
    }

    pub fn matches(self, vehicle: &VehicleTelemetry) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => vehicle.vehicle_status == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Only(status) => f.write_str(status.label()),
        }
    }
}

pub fn filter_by_status(vehicles: &[VehicleTelemetry], filter: StatusFilter) -> Vec<&VehicleTelemetry> {
    vehicles.iter().filter(|v| filter.matches(v)).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::api::models::{AlertStatus, AlertType};
    use crate::api::{Alert, VehicleStatus, VehicleTelemetry, VehicleType};

    pub fn vehicle(id: &str, status: VehicleStatus, speed: f64, fuel: f64) -> VehicleTelemetry {
        VehicleTelemetry {
            id: 1,
            vehicle_id: id.to_string(),
            vehicle_type: VehicleType::Police,
            vehicle_status: status,
            timestamp: Utc.with_ymd_and_hms(2025, 12, 28, 10, 0, 0).unwrap(),
            latitude: 48.77,
            longitude: 9.18,
            speed,
            fuel_level: fuel,
            engine_temp: 90.0,
            battery_voltage: 12.6,
            emergency_lights_active: false,
        }
    }

    pub fn alert(id: i64, alert_type: AlertType) -> Alert {
        Alert {
            id,
            vehicle_id: format!("POL-{:03}", id),
            vehicle_type: VehicleType::Police,
            alert_type,
            status: AlertStatus::Active,
            message: String::new(),
            threshold_value: 20.0,
            actual_value: 15.0,
            created_at: Utc.with_ymd_and_hms(2025, 12, 28, 9, 0, 0).unwrap(),
            acknowledged_at: None,
            resolved_at: None,
        }
    }
}
