//! Wire types returned by the fleet backend.
//!
//! Everything here is decoded once at the API boundary. List payloads go
//! through [`normalize_list`] so consumers never see a non-array shape.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of emergency vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Police,
    Ambulance,
    FireTruck,
}

impl VehicleType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Police => "POLICE",
            Self::Ambulance => "AMBULANCE",
            Self::FireTruck => "FIRE_TRUCK",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Police => "POLICE",
            Self::Ambulance => "AMBULANCE",
            Self::FireTruck => "FIRE TRUCK",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Police => "🚓",
            Self::Ambulance => "🚑",
            Self::FireTruck => "🚒",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "POLICE" => Ok(Self::Police),
            "AMBULANCE" => Ok(Self::Ambulance),
            "FIRE_TRUCK" => Ok(Self::FireTruck),
            other => Err(format!("unknown vehicle type `{}`", other)),
        }
    }
}

/// Operational status reported with each telemetry reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Idle,
    EnRoute,
    OnScene,
    Returning,
}

impl VehicleStatus {
    pub const ALL: [Self; 4] = [Self::Idle, Self::EnRoute, Self::OnScene, Self::Returning];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::EnRoute => "EN_ROUTE",
            Self::OnScene => "ON_SCENE",
            Self::Returning => "RETURNING",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::EnRoute => "En Route",
            Self::OnScene => "On Scene",
            Self::Returning => "Returning",
        }
    }

    /// Compact label for the status overview card
    pub fn short_label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::EnRoute => "EnRoute",
            Self::OnScene => "OnScene",
            Self::Returning => "Return",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "IDLE" => Ok(Self::Idle),
            "EN_ROUTE" | "ENROUTE" => Ok(Self::EnRoute),
            "ON_SCENE" | "ONSCENE" => Ok(Self::OnScene),
            "RETURNING" => Ok(Self::Returning),
            other => Err(format!("unknown vehicle status `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    LowFuel,
    HighEngineTemp,
    LowBattery,
    VehicleIdleTooLong,
    EmergencyStatusChange,
}

impl AlertType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowFuel => "LOW_FUEL",
            Self::HighEngineTemp => "HIGH_ENGINE_TEMP",
            Self::LowBattery => "LOW_BATTERY",
            Self::VehicleIdleTooLong => "VEHICLE_IDLE_TOO_LONG",
            Self::EmergencyStatusChange => "EMERGENCY_STATUS_CHANGE",
        }
    }

    pub fn label(self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Engine temperature and fuel alerts need immediate attention.
    pub fn is_critical(self) -> bool {
        matches!(self, Self::HighEngineTemp | Self::LowFuel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Acknowledged => write!(f, "ACKNOWLEDGED"),
            Self::Resolved => write!(f, "RESOLVED"),
        }
    }
}

/// Point-in-time vehicle reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleTelemetry {
    pub id: i64,
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub vehicle_status: VehicleStatus,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    pub fuel_level: f64,
    pub engine_temp: f64,
    pub battery_voltage: f64,
    pub emergency_lights_active: bool,
}

impl VehicleTelemetry {
    pub fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Threshold violation raised against a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: i64,
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub alert_type: AlertType,
    pub status: AlertStatus,
    #[serde(default)]
    pub message: String,
    pub threshold_value: f64,
    pub actual_value: f64,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn is_critical(&self) -> bool {
        self.alert_type.is_critical()
    }
}

/// Live fleet-wide aggregate snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FleetAnalytics {
    pub total_vehicles: u32,
    pub total_telemetry_received: u64,
    pub fleet_average_speed: f64,
    pub total_fuel_consumed: f64,
    #[serde(deserialize_with = "lenient_map")]
    pub vehicles_by_type: BTreeMap<VehicleType, u64>,
    #[serde(deserialize_with = "lenient_map")]
    pub average_speed_by_type: BTreeMap<VehicleType, f64>,
    #[serde(deserialize_with = "lenient_map")]
    pub current_status_overview: BTreeMap<VehicleStatus, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyFleetMetrics {
    pub date: NaiveDate,
    #[serde(default)]
    pub total_vehicles: Option<u32>,
    #[serde(default)]
    pub fleet_average_speed: Option<f64>,
    #[serde(default)]
    pub total_fuel_consumed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub average_speed_by_type: BTreeMap<VehicleType, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyVehicleMetrics {
    pub vehicle_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub vehicle_type: Option<VehicleType>,
    #[serde(default)]
    pub average_speed: Option<f64>,
    #[serde(default)]
    pub max_speed: Option<f64>,
    #[serde(default)]
    pub min_speed: Option<f64>,
    #[serde(default, rename = "averageFuelLevel")]
    pub average_fuel: Option<f64>,
    #[serde(default, rename = "minFuelLevel")]
    pub min_fuel: Option<f64>,
    #[serde(default)]
    pub fuel_consumed: Option<f64>,
    #[serde(default)]
    pub total_telemetry_points: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFuelConsumption {
    pub vehicle_id: String,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub total_consumed: Option<f64>,
}

/// Aggregated metrics for a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalMetricsResponse {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_days: u32,
    #[serde(default)]
    pub days_with_data: Option<u32>,
    #[serde(default)]
    pub average_fleet_speed: Option<f64>,
    #[serde(default)]
    pub total_fuel_consumed: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_data_points: u64,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub daily_fleet_metrics: Vec<DailyFleetMetrics>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub daily_vehicle_metrics: Vec<DailyVehicleMetrics>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub vehicle_fuel_consumption: Vec<VehicleFuelConsumption>,
}

impl HistoricalMetricsResponse {
    /// Days that produced aggregates. The backend may leave the counter
    /// unset, in which case the daily fleet rows are counted instead.
    pub fn covered_days(&self) -> u32 {
        self.days_with_data
            .unwrap_or(self.daily_fleet_metrics.len() as u32)
    }
}

/// Decode a list payload, treating anything that is not a JSON array as empty.
pub fn normalize_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, serde_json::Error> {
    match value {
        Value::Array(items) => items.into_iter().map(serde_json::from_value).collect(),
        other => {
            tracing::warn!(kind = json_kind(&other), "expected a JSON array, using an empty list");
            Ok(Vec::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    normalize_list(value).map_err(serde::de::Error::custom)
}

/// Counters the backend leaves unset arrive as explicit nulls.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keys that do not parse and null values are dropped.
fn lenient_map<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: FromStr + Ord,
    V: DeserializeOwned,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };

    let mut map = BTreeMap::new();
    for (key, value) in entries {
        if value.is_null() {
            continue;
        }
        let Ok(key) = key.parse::<K>() else {
            tracing::debug!(key = %key, "skipping unrecognized map key");
            continue;
        };
        let value = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Backend timestamps arrive either with an offset or as naive UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{}`", raw)))
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{}`", raw))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_telemetry_with_naive_timestamp() {
        let payload = json!({
            "id": 7,
            "vehicleId": "FIRE-001",
            "vehicleType": "FIRE_TRUCK",
            "vehicleStatus": "EN_ROUTE",
            "timestamp": "2025-12-28T10:15:30.123",
            "latitude": 48.77,
            "longitude": 9.18,
            "speed": 72.5,
            "fuelLevel": 64.0,
            "engineTemp": 88.0,
            "batteryVoltage": 12.6,
            "emergencyLightsActive": true
        });

        let telemetry: VehicleTelemetry = serde_json::from_value(payload).unwrap();
        assert_eq!(telemetry.vehicle_type, VehicleType::FireTruck);
        assert_eq!(telemetry.vehicle_status, VehicleStatus::EnRoute);
        assert_eq!(telemetry.position(), (48.77, 9.18));
        assert_eq!(telemetry.timestamp.to_rfc3339(), "2025-12-28T10:15:30.123+00:00");
    }

    #[test]
    fn decodes_alert_with_optional_timestamps() {
        let payload = json!({
            "id": 3,
            "vehicleId": "AMB-004",
            "vehicleType": "AMBULANCE",
            "alertType": "LOW_FUEL",
            "status": "ACKNOWLEDGED",
            "message": "Fuel below 20%",
            "thresholdValue": 20.0,
            "actualValue": 15.0,
            "createdAt": "2025-12-28T10:00:00Z",
            "acknowledgedAt": "2025-12-28T10:05:00Z",
            "resolvedAt": null
        });

        let alert: Alert = serde_json::from_value(payload).unwrap();
        assert!(alert.is_critical());
        assert_eq!(alert.status, AlertStatus::Acknowledged);
        assert!(alert.acknowledged_at.is_some());
        assert!(alert.resolved_at.is_none());
    }

    #[test]
    fn non_array_list_payload_is_empty() {
        let alerts: Vec<Alert> = normalize_list(json!({"error": "nope"})).unwrap();
        assert!(alerts.is_empty());
        let alerts: Vec<Alert> = normalize_list(Value::Null).unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn malformed_list_element_is_an_error() {
        let result: Result<Vec<Alert>, _> = normalize_list(json!([{"id": "not-a-number"}]));
        assert!(result.is_err());
    }

    #[test]
    fn history_tolerates_null_lists_and_unknown_type_keys() {
        let payload = json!({
            "fromDate": "2025-12-21",
            "toDate": "2025-12-28",
            "totalDays": 8,
            "daysWithData": 1,
            "averageFleetSpeed": 41.2,
            "totalFuelConsumed": 120.0,
            "totalDataPoints": 900,
            "dailyFleetMetrics": [{
                "date": "2025-12-27",
                "fleetAverageSpeed": null,
                "averageSpeedByType": {"POLICE": 50.0, "HOVERCRAFT": 10.0, "AMBULANCE": null}
            }],
            "dailyVehicleMetrics": null,
        });

        let history: HistoricalMetricsResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(history.daily_fleet_metrics.len(), 1);
        let day = &history.daily_fleet_metrics[0];
        assert_eq!(day.fleet_average_speed, None);
        assert_eq!(
            day.average_speed_by_type,
            BTreeMap::from([(VehicleType::Police, 50.0)])
        );
        assert!(history.daily_vehicle_metrics.is_empty());
        assert!(history.vehicle_fuel_consumption.is_empty());
    }

    #[test]
    fn history_null_counters_decode_as_zero() {
        let payload = json!({
            "fromDate": "2025-12-27",
            "toDate": "2025-12-28",
            "totalDays": 2,
            "daysWithData": null,
            "totalDataPoints": null,
            "averageFleetSpeed": null,
            "totalFuelConsumed": null
        });

        let history: HistoricalMetricsResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(history.total_days, 2);
        assert_eq!(history.days_with_data, None);
        assert_eq!(history.covered_days(), 0);
        assert_eq!(history.total_data_points, 0);
        assert_eq!(history.average_fleet_speed, None);
    }

    #[test]
    fn decodes_analytics_service_history_payload() {
        let payload = json!({
            "fromDate": "2025-12-26",
            "toDate": "2025-12-28",
            "totalDays": 3,
            "daysWithData": null,
            "averageFleetSpeed": 38.75,
            "totalFuelConsumed": 212.4,
            "totalDataPoints": 5184,
            "dailyFleetMetrics": [{
                "id": 11,
                "date": "2025-12-27",
                "totalVehicles": 12,
                "fleetAverageSpeed": 38.75,
                "totalFuelConsumed": 212.4,
                "averageSpeedByStatus": {"IDLE": 0.0, "EN_ROUTE": 71.2},
                "averageSpeedByType": {"AMBULANCE": 44.1, "FIRE_TRUCK": 36.0, "POLICE": 52.3}
            }],
            "dailyVehicleMetrics": [{
                "id": 40,
                "vehicleId": "AMB-001",
                "date": "2025-12-27",
                "vehicleStatus": "EN_ROUTE",
                "vehicleType": "AMBULANCE",
                "averageSpeed": 44.1,
                "maxSpeed": 96.0,
                "minSpeed": 0.0,
                "averageFuelLevel": 63.5,
                "minFuelLevel": 20.0,
                "fuelConsumed": 18.2,
                "totalTelemetryPoints": 432
            }],
            "vehicleFuelConsumption": [{
                "vehicleId": "AMB-001",
                "vehicleType": "AMBULANCE",
                "totalConsumed": 18.2
            }]
        });

        let history: HistoricalMetricsResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(history.total_days, 3);
        assert_eq!(history.covered_days(), 1);
        assert_eq!(history.total_data_points, 5184);
        assert_eq!(history.daily_fleet_metrics[0].total_vehicles, Some(12));
        assert_eq!(
            history.daily_fleet_metrics[0].average_speed_by_type.get(&VehicleType::Police),
            Some(&52.3)
        );

        let vehicle = &history.daily_vehicle_metrics[0];
        assert_eq!(vehicle.vehicle_type, Some(VehicleType::Ambulance));
        assert_eq!(vehicle.average_fuel, Some(63.5));
        assert_eq!(vehicle.min_fuel, Some(20.0));
        assert_eq!(vehicle.fuel_consumed, Some(18.2));
        assert_eq!(vehicle.total_telemetry_points, Some(432));
        assert_eq!(history.vehicle_fuel_consumption[0].total_consumed, Some(18.2));
    }

    #[test]
    fn fleet_analytics_defaults_missing_sections() {
        let analytics: FleetAnalytics =
            serde_json::from_value(json!({"totalVehicles": 12, "fleetAverageSpeed": 33.5})).unwrap();
        assert_eq!(analytics.total_vehicles, 12);
        assert!(analytics.current_status_overview.is_empty());
    }

    #[test]
    fn parses_status_from_cli_spelling() {
        assert_eq!("en-route".parse::<VehicleStatus>(), Ok(VehicleStatus::EnRoute));
        assert_eq!("ON_SCENE".parse::<VehicleStatus>(), Ok(VehicleStatus::OnScene));
        assert!("parked".parse::<VehicleStatus>().is_err());
        assert_eq!("fire truck".parse::<VehicleType>(), Ok(VehicleType::FireTruck));
    }
}
