//! One-shot commands that print backend data instead of opening the dashboard

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use std::io::Write;

use crate::api::{Alert, FleetApi, VehicleStatus, VehicleTelemetry};
use crate::core::charts;
use crate::core::metrics::{alert_split, filter_by_status, DashboardStats, StatusFilter};
use crate::ui::widgets::truncate;

pub fn parse_status(raw: &str) -> Result<VehicleStatus, String> {
    raw.parse()
}

fn vehicle_row(out: &mut impl Write, v: &VehicleTelemetry) -> Result<()> {
    writeln!(
        out,
        "{:<12} {:<11} {:<10} {:>8.1} {:>7.1} {:>7.1} {:>6.2} {:<6} {}",
        truncate(&v.vehicle_id, 12),
        v.vehicle_type.as_str(),
        v.vehicle_status.as_str(),
        v.speed,
        v.fuel_level,
        v.engine_temp,
        v.battery_voltage,
        if v.emergency_lights_active { "on" } else { "off" },
        v.timestamp.format("%Y-%m-%d %H:%M:%S"),
    )?;
    Ok(())
}

fn vehicle_header(out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{:<12} {:<11} {:<10} {:>8} {:>7} {:>7} {:>6} {:<6} LAST REPORT",
        "VEHICLE", "TYPE", "STATUS", "KM/H", "FUEL%", "TEMP°C", "VOLT", "LIGHTS"
    )?;
    writeln!(out, "{}", "-".repeat(96))?;
    Ok(())
}

/// Latest telemetry per vehicle, optionally narrowed to one status
pub async fn vehicles(
    api: &dyn FleetApi,
    status: Option<VehicleStatus>,
    out: &mut impl Write,
) -> Result<()> {
    let telemetry = api.latest_telemetry().await?;
    let filter = status.map(StatusFilter::Only).unwrap_or_default();
    let visible = filter_by_status(&telemetry, filter);

    vehicle_header(out)?;
    for vehicle in &visible {
        vehicle_row(out, vehicle)?;
    }

    let stats = DashboardStats::compute(&telemetry, &[]);
    writeln!(out)?;
    writeln!(
        out,
        "{} shown, {} total, {} available · avg speed {:.1} km/h · avg fuel {:.1}%",
        visible.len(),
        stats.total_vehicles,
        stats.available,
        stats.averages.speed,
        stats.averages.fuel_level
    )?;
    Ok(())
}

/// Telemetry history for one vehicle, newest first
pub async fn vehicle(api: &dyn FleetApi, vehicle_id: &str, out: &mut impl Write) -> Result<()> {
    let mut readings = api.vehicle_telemetry(vehicle_id).await?;
    if readings.is_empty() {
        writeln!(out, "No telemetry recorded for {}", vehicle_id)?;
        return Ok(());
    }
    readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    vehicle_header(out)?;
    for reading in &readings {
        vehicle_row(out, reading)?;
    }
    Ok(())
}

fn alert_row(out: &mut impl Write, alert: &Alert) -> Result<()> {
    writeln!(
        out,
        "{:<6} {:<8} {:<18} {:<12} {:<13} {:>9.1} {:>9.1}  {}",
        alert.id,
        if alert.is_critical() { "CRITICAL" } else { "WARNING" },
        alert.alert_type.as_str(),
        truncate(&alert.vehicle_id, 12),
        alert.status.to_string(),
        alert.actual_value,
        alert.threshold_value,
        truncate(&alert.message, 40),
    )?;
    Ok(())
}

pub async fn alerts(api: &dyn FleetApi, out: &mut impl Write) -> Result<()> {
    let alerts = api.active_alerts().await?;

    writeln!(
        out,
        "{:<6} {:<8} {:<18} {:<12} {:<13} {:>9} {:>9}  MESSAGE",
        "ID", "SEVERITY", "TYPE", "VEHICLE", "STATUS", "ACTUAL", "LIMIT"
    )?;
    writeln!(out, "{}", "-".repeat(100))?;
    for alert in &alerts {
        alert_row(out, alert)?;
    }

    let split = alert_split(&alerts);
    writeln!(out)?;
    writeln!(
        out,
        "{} active: {} critical, {} warning",
        split.total, split.critical, split.warning
    )?;
    Ok(())
}

pub async fn acknowledge(api: &dyn FleetApi, alert_id: i64, out: &mut impl Write) -> Result<()> {
    let alert = api
        .acknowledge_alert(alert_id)
        .await
        .with_context(|| format!("Failed to acknowledge alert {}", alert_id))?;
    writeln!(out, "Alert {} acknowledged ({})", alert.id, alert.status)?;
    Ok(())
}

pub async fn resolve(api: &dyn FleetApi, alert_id: i64, out: &mut impl Write) -> Result<()> {
    let alert = api
        .resolve_alert(alert_id)
        .await
        .with_context(|| format!("Failed to resolve alert {}", alert_id))?;
    writeln!(out, "Alert {} resolved ({})", alert.id, alert.status)?;
    Ok(())
}

pub async fn fleet(api: &dyn FleetApi, out: &mut impl Write) -> Result<()> {
    let fleet = api.fleet_analytics().await?;

    writeln!(out, "{:<24} {}", "Total vehicles", fleet.total_vehicles)?;
    writeln!(out, "{:<24} {}", "Telemetry received", fleet.total_telemetry_received)?;
    writeln!(out, "{:<24} {:.1} km/h", "Average speed", fleet.fleet_average_speed)?;
    writeln!(out, "{:<24} {:.1} L", "Fuel consumed", fleet.total_fuel_consumed)?;

    writeln!(out, "\nBy type:")?;
    for (vehicle_type, count) in &fleet.vehicles_by_type {
        let speed = fleet
            .average_speed_by_type
            .get(vehicle_type)
            .map(|s| format!("{:.1} km/h", s))
            .unwrap_or_else(|| "n/a".to_string());
        writeln!(out, "  {:<12} {:>5}  {}", vehicle_type.as_str(), count, speed)?;
    }

    writeln!(out, "\nStatus:")?;
    for (status, count) in &fleet.current_status_overview {
        writeln!(out, "  {:<12} {:>5}", status.as_str(), count)?;
    }
    Ok(())
}

/// Turn the optional `--from`/`--to`/`--days` flags into a concrete range
pub fn history_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    days: u32,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let to = to.unwrap_or(today);
    let from = from.unwrap_or_else(|| to - Duration::days(i64::from(days)));
    if from > to {
        bail!("--from {} is after --to {}", from, to);
    }
    Ok((from, to))
}

fn print_bars(out: &mut impl Write, title: &str, bars: &[charts::Bar], unit: &str) -> Result<()> {
    writeln!(out, "\n{}:", title)?;
    if bars.is_empty() {
        writeln!(out, "  (no data)")?;
        return Ok(());
    }

    let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
    for bar in bars {
        let width = if max > 0.0 {
            (bar.value / max * 30.0).round() as usize
        } else {
            0
        };
        writeln!(
            out,
            "  {:<14} {:<30} {:.1}{}",
            truncate(&bar.label, 14),
            "█".repeat(width),
            bar.value,
            unit
        )?;
    }
    Ok(())
}

pub async fn history(
    api: &dyn FleetApi,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    days: u32,
    out: &mut impl Write,
) -> Result<()> {
    let (from, to) = history_range(from, to, days, Utc::now().date_naive())?;
    let history = api.historical_metrics(from, to).await?;

    let optional = |value: Option<f64>, unit: &str| {
        value
            .map(|v| format!("{:.1}{}", v, unit))
            .unwrap_or_else(|| "n/a".to_string())
    };

    writeln!(out, "{} → {}", history.from_date, history.to_date)?;
    writeln!(
        out,
        "{:<24} {}/{}",
        "Days with data", history.covered_days(), history.total_days
    )?;
    writeln!(
        out,
        "{:<24} {}",
        "Average fleet speed",
        optional(history.average_fleet_speed, " km/h")
    )?;
    writeln!(
        out,
        "{:<24} {}",
        "Fuel consumed",
        optional(history.total_fuel_consumed, " L")
    )?;
    writeln!(out, "{:<24} {}", "Data points", history.total_data_points)?;

    writeln!(out, "\nSpeed trend:")?;
    let trend = charts::speed_trend(&history.daily_fleet_metrics);
    if trend.is_empty() {
        writeln!(out, "  (no data)")?;
    }
    for point in &trend {
        writeln!(out, "  {}  {:.1} km/h", point.label, point.value)?;
    }

    let by_type = charts::latest_speed_by_type(&history)
        .map(charts::speed_by_type)
        .unwrap_or_default();
    print_bars(out, "Speed by type", &by_type, " km/h")?;
    print_bars(
        out,
        "Speed by vehicle",
        &charts::speed_by_vehicle(&history.daily_vehicle_metrics),
        " km/h",
    )?;
    print_bars(
        out,
        "Fuel by vehicle",
        &charts::fuel_by_vehicle(&history.daily_vehicle_metrics, &history.vehicle_fuel_consumption),
        " L",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{AlertStatus, AlertType};
    use crate::api::{ApiError, MockFleetApi};
    use crate::core::metrics::fixtures::{alert, vehicle as reading};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, day).unwrap()
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn history_range_defaults_to_days_before_today() {
        assert_eq!(history_range(None, None, 7, date(28)).unwrap(), (date(21), date(28)));
        assert_eq!(
            history_range(Some(date(1)), Some(date(3)), 7, date(28)).unwrap(),
            (date(1), date(3))
        );
        assert_eq!(history_range(None, Some(date(10)), 2, date(28)).unwrap(), (date(8), date(10)));
    }

    #[test]
    fn history_range_rejects_inverted_bounds() {
        assert!(history_range(Some(date(5)), Some(date(2)), 7, date(28)).is_err());
    }

    #[tokio::test]
    async fn vehicles_respects_status_filter() {
        let mut api = MockFleetApi::new();
        api.expect_latest_telemetry().returning(|| {
            Ok(vec![
                reading("POL-001", VehicleStatus::Idle, 0.0, 80.0),
                reading("POL-002", VehicleStatus::EnRoute, 64.0, 50.0),
            ])
        });

        let mut buf = Vec::new();
        vehicles(&api, Some(VehicleStatus::EnRoute), &mut buf).await.unwrap();
        let text = output(buf);

        assert!(text.contains("POL-002"));
        assert!(!text.contains("POL-001"));
        assert!(text.contains("1 shown, 2 total"));
    }

    #[tokio::test]
    async fn alerts_prints_severity_split() {
        let mut api = MockFleetApi::new();
        api.expect_active_alerts().returning(|| {
            Ok(vec![
                alert(1, AlertType::LowFuel),
                alert(2, AlertType::HighEngineTemp),
                alert(3, AlertType::LowBattery),
            ])
        });

        let mut buf = Vec::new();
        alerts(&api, &mut buf).await.unwrap();

        assert!(output(buf).contains("3 active: 2 critical, 1 warning"));
    }

    #[tokio::test]
    async fn long_alert_messages_are_cut_to_column_width() {
        let mut api = MockFleetApi::new();
        api.expect_active_alerts().returning(|| {
            let mut long = alert(7, AlertType::LowFuel);
            long.message = "Fuel level dropped below the configured threshold while en route".into();
            Ok(vec![long])
        });

        let mut buf = Vec::new();
        alerts(&api, &mut buf).await.unwrap();

        let text = output(buf);
        let row = text.lines().find(|l| l.starts_with('7')).unwrap();
        let message = row.rsplit("  ").next().unwrap();
        assert_eq!(message, "Fuel level dropped below the configured…");
        assert!(!text.contains("..."));
    }

    #[tokio::test]
    async fn acknowledge_reports_new_status() {
        let mut api = MockFleetApi::new();
        api.expect_acknowledge_alert().with(eq(7)).times(1).returning(|id| {
            let mut acked = alert(id, AlertType::LowFuel);
            acked.status = AlertStatus::Acknowledged;
            Ok(acked)
        });

        let mut buf = Vec::new();
        acknowledge(&api, 7, &mut buf).await.unwrap();

        assert!(output(buf).starts_with("Alert 7 acknowledged"));
    }

    #[tokio::test]
    async fn resolve_failure_is_reported() {
        let mut api = MockFleetApi::new();
        api.expect_resolve_alert()
            .returning(|_| Err(ApiError::InvalidUrl("nowhere".into())));

        let mut buf = Vec::new();
        let err = resolve(&api, 9, &mut buf).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to resolve alert 9");
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn empty_vehicle_history() {
        let mut api = MockFleetApi::new();
        api.expect_vehicle_telemetry().returning(|_| Ok(Vec::new()));

        let mut buf = Vec::new();
        vehicle(&api, "AMB-404", &mut buf).await.unwrap();

        assert_eq!(output(buf), "No telemetry recorded for AMB-404\n");
    }
}
