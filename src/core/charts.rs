//! Shaping historical metrics into chart series

use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use palette::Srgb;
use std::collections::{BTreeMap, HashMap};

use crate::api::{
    DailyFleetMetrics, DailyVehicleMetrics, HistoricalMetricsResponse, VehicleFuelConsumption,
    VehicleType,
};

/// Blue, green, red, purple, orange
pub const PALETTE: [Srgb<u8>; 5] = [
    Srgb::new(59, 130, 246),
    Srgb::new(34, 197, 94),
    Srgb::new(239, 68, 68),
    Srgb::new(168, 85, 247),
    Srgb::new(249, 115, 22),
];

pub fn palette_color(index: usize) -> Srgb<u8> {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: Srgb<u8>,
}

/// Map each key to a palette color by its position in sorted order, so a
/// category keeps its color however the input is ordered.
fn stable_colors<'a, I>(keys: I) -> HashMap<&'a str, Srgb<u8>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sorted: Vec<&str> = keys.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, key)| (key, palette_color(i)))
        .collect()
}

/// Daily fleet average speed. Days without a value are left out rather than
/// plotted as zero.
pub fn speed_trend(daily: &[DailyFleetMetrics]) -> Vec<ChartPoint> {
    daily
        .iter()
        .filter_map(|day| {
            day.fleet_average_speed.map(|value| ChartPoint {
                date: day.date,
                label: day.date.format("%Y-%m-%d").to_string(),
                value,
            })
        })
        .collect()
}

pub fn speed_by_type(speeds: &BTreeMap<VehicleType, f64>) -> Vec<Bar> {
    let colors = stable_colors(speeds.keys().map(|t| t.as_str()));
    speeds
        .iter()
        .map(|(vehicle_type, speed)| Bar {
            label: vehicle_type.as_str().replace('_', " "),
            value: *speed,
            color: colors[vehicle_type.as_str()],
        })
        .collect()
}

/// Average speed per vehicle over the range, fastest first.
pub fn speed_by_vehicle(metrics: &[DailyVehicleMetrics]) -> Vec<Bar> {
    let mut samples: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in metrics {
        let Some(speed) = row.average_speed else {
            continue;
        };
        let entry = samples.entry(row.vehicle_id.as_str()).or_default();
        entry.0 += speed;
        entry.1 += 1;
    }

    let colors = stable_colors(samples.keys().copied());
    let mut bars: Vec<Bar> = samples
        .iter()
        .map(|(id, (sum, count))| Bar {
            label: id.to_string(),
            value: sum / *count as f64,
            color: colors[id],
        })
        .collect();

    bars.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    bars
}

/// Fuel consumed per vehicle, one segment for every vehicle seen in the
/// daily metrics. Vehicles with no consumption record count as zero.
pub fn fuel_by_vehicle(
    metrics: &[DailyVehicleMetrics],
    consumption: &[VehicleFuelConsumption],
) -> Vec<Bar> {
    let totals: HashMap<&str, f64> = consumption
        .iter()
        .filter_map(|c| c.total_consumed.map(|total| (c.vehicle_id.as_str(), total)))
        .collect();

    let mut vehicles: IndexMap<&str, f64> = IndexMap::new();
    for row in metrics {
        let id = row.vehicle_id.as_str();
        vehicles
            .entry(id)
            .or_insert_with(|| totals.get(id).copied().unwrap_or(0.0));
    }

    vehicles
        .into_iter()
        .enumerate()
        .map(|(i, (id, value))| Bar {
            label: id.to_string(),
            value,
            color: palette_color(i),
        })
        .collect()
}

/// Per-type speeds of the first day that has a fleet speed
pub fn latest_speed_by_type(history: &HistoricalMetricsResponse) -> Option<&BTreeMap<VehicleType, f64>> {
    history
        .daily_fleet_metrics
        .iter()
        .find(|day| day.fleet_average_speed.is_some())
        .map(|day| &day.average_speed_by_type)
}

/// The `days` days leading up to and including `today`
pub fn default_history_range(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(i64::from(days)), today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, day).unwrap()
    }

    fn fleet_day(day: u32, speed: Option<f64>) -> DailyFleetMetrics {
        DailyFleetMetrics {
            date: date(day),
            total_vehicles: Some(10),
            fleet_average_speed: speed,
            total_fuel_consumed: None,
            average_speed_by_type: BTreeMap::from([(VehicleType::Police, day as f64)]),
        }
    }

    fn vehicle_day(id: &str, speed: Option<f64>) -> DailyVehicleMetrics {
        DailyVehicleMetrics {
            vehicle_id: id.to_string(),
            date: date(1),
            vehicle_type: None,
            average_speed: speed,
            max_speed: None,
            min_speed: None,
            average_fuel: None,
            min_fuel: None,
            fuel_consumed: None,
            total_telemetry_points: None,
        }
    }

    fn fuel(id: &str, total: Option<f64>) -> VehicleFuelConsumption {
        VehicleFuelConsumption {
            vehicle_id: id.to_string(),
            vehicle_type: None,
            total_consumed: total,
        }
    }

    #[test]
    fn trend_skips_days_without_speed() {
        let daily = vec![
            fleet_day(1, Some(10.0)),
            fleet_day(2, None),
            fleet_day(3, Some(20.0)),
        ];
        let points = speed_trend(&daily);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].label, "2025-12-01");
        assert_eq!(points[0].value, 10.0);
        assert_eq!(points[1].date, date(3));
        assert_eq!(points[1].value, 20.0);
    }

    #[test]
    fn type_bars_use_spaced_labels_and_sorted_colors() {
        let speeds = BTreeMap::from([
            (VehicleType::Police, 55.0),
            (VehicleType::FireTruck, 40.0),
            (VehicleType::Ambulance, 62.0),
        ]);
        let bars = speed_by_type(&speeds);
        let fire = bars.iter().find(|b| b.label == "FIRE TRUCK").unwrap();
        let ambulance = bars.iter().find(|b| b.label == "AMBULANCE").unwrap();
        let police = bars.iter().find(|b| b.label == "POLICE").unwrap();

        assert_eq!(ambulance.color, PALETTE[0]);
        assert_eq!(fire.color, PALETTE[1]);
        assert_eq!(police.color, PALETTE[2]);
        assert_eq!(fire.value, 40.0);
    }

    #[test]
    fn vehicle_bars_average_and_sort_descending() {
        let metrics = vec![
            vehicle_day("POL-002", Some(30.0)),
            vehicle_day("AMB-001", Some(50.0)),
            vehicle_day("POL-002", Some(50.0)),
            vehicle_day("AMB-001", None),
            vehicle_day("FIRE-003", Some(40.0)),
        ];
        let bars = speed_by_vehicle(&metrics);

        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["AMB-001", "FIRE-003", "POL-002"]);
        assert_eq!(bars[0].value, 50.0);
        assert_eq!(bars[2].value, 40.0);
    }

    #[test]
    fn vehicle_colors_ignore_input_order() {
        let forward = speed_by_vehicle(&[vehicle_day("A", Some(1.0)), vehicle_day("B", Some(2.0))]);
        let reverse = speed_by_vehicle(&[vehicle_day("B", Some(2.0)), vehicle_day("A", Some(1.0))]);
        assert_eq!(forward, reverse);
        let a = forward.iter().find(|b| b.label == "A").unwrap();
        assert_eq!(a.color, PALETTE[0]);
    }

    #[test]
    fn fuel_defaults_to_zero_for_unknown_vehicles() {
        let metrics = vec![
            vehicle_day("POL-002", Some(30.0)),
            vehicle_day("AMB-001", Some(50.0)),
            vehicle_day("POL-002", Some(35.0)),
            vehicle_day("FIRE-003", None),
        ];
        let consumption = vec![fuel("POL-002", Some(12.5)), fuel("FIRE-003", None)];
        let bars = fuel_by_vehicle(&metrics, &consumption);

        let values: Vec<(&str, f64)> = bars.iter().map(|b| (b.label.as_str(), b.value)).collect();
        assert_eq!(
            values,
            vec![("POL-002", 12.5), ("AMB-001", 0.0), ("FIRE-003", 0.0)]
        );
        assert_eq!(bars[1].color, PALETTE[1]);
    }

    #[test]
    fn latest_speed_by_type_picks_first_day_with_speed() {
        let history = HistoricalMetricsResponse {
            from_date: date(1),
            to_date: date(3),
            total_days: 3,
            days_with_data: Some(2),
            average_fleet_speed: Some(15.0),
            total_fuel_consumed: None,
            total_data_points: 10,
            daily_fleet_metrics: vec![fleet_day(1, None), fleet_day(2, Some(12.0)), fleet_day(3, Some(18.0))],
            daily_vehicle_metrics: Vec::new(),
            vehicle_fuel_consumption: Vec::new(),
        };
        let speeds = latest_speed_by_type(&history).unwrap();
        assert_eq!(speeds[&VehicleType::Police], 2.0);

        let empty = HistoricalMetricsResponse {
            daily_fleet_metrics: vec![fleet_day(1, None)],
            ..history
        };
        assert!(latest_speed_by_type(&empty).is_none());
    }

    #[test]
    fn history_range_ends_today() {
        let (from, to) = default_history_range(date(28), 7);
        assert_eq!(from, date(21));
        assert_eq!(to, date(28));
    }
}
