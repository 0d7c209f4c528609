//! Fleetwatch - live terminal dashboard for an emergency vehicle fleet
//!
//! Polls the fleet backend for vehicle telemetry, alerts and aggregate
//! metrics, and renders them as a dashboard plus an analytics screen.
//! Subcommands print the same data once and exit.

mod api;
mod cli;
mod config;
mod core;
mod ui;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::{FleetApi, FleetClient, VehicleStatus};
use crate::config::Config;
use crate::core::app::App;

#[derive(Parser)]
#[command(name = "fleetwatch")]
#[command(version)]
#[command(about = "Live terminal dashboard for emergency vehicle fleets", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the configuration file
    #[arg(long, env = "FLEETWATCH_API_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Deployment environment name, overriding the configuration file
    #[arg(long, env = "FLEETWATCH_ENVIRONMENT", global = true)]
    environment: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the latest telemetry for every vehicle
    Vehicles {
        /// Only show vehicles with this status (idle, en_route, on_scene, returning)
        #[arg(short, long, value_parser = cli::parse_status)]
        status: Option<VehicleStatus>,
    },

    /// Print the telemetry history of one vehicle
    Vehicle {
        /// Vehicle identifier, e.g. AMB-001
        id: String,
    },

    /// Print active alerts
    Alerts,

    /// Acknowledge an alert
    Ack {
        /// Alert id
        id: i64,
    },

    /// Resolve an alert
    Resolve {
        /// Alert id
        id: i64,
    },

    /// Print the live fleet analytics snapshot
    Fleet,

    /// Print historical metrics for a date range
    History {
        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day of the range (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Range length in days when --from is not given
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Write a starter configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

fn setup_logging(verbosity: u8) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout belongs to the terminal UI
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fleetwatch")
        .join("logs");

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "fleetwatch.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

/// File (when present) plus flag and environment overrides, validated
fn resolve_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config.clone().or_else(|| {
        let default_config = Config::default_path()?;
        default_config.exists().then_some(default_config)
    });

    let mut config = match config_path {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    config.apply_overrides(cli.base_url.clone(), cli.environment.clone());
    config
        .validate()
        .context("Run `fleetwatch init` or pass --base-url and --environment")?;

    tracing::info!(
        base_url = config.api.base_url.as_deref().unwrap_or_default(),
        environment = config.api.environment.as_deref().unwrap_or_default(),
        "configuration loaded"
    );
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive for the duration of the program
    let _logging_guard = setup_logging(cli.verbose)?;

    if let Some(Commands::Init { force }) = &cli.command {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => Config::default_path().context("No configuration directory on this system")?,
        };
        return config::init_config(&path, *force);
    }

    let config = resolve_config(&cli)?;
    let api: Arc<dyn FleetApi> = Arc::new(FleetClient::from_config(&config.api)?);
    let mut stdout = std::io::stdout();

    match cli.command {
        Some(Commands::Vehicles { status }) => cli::vehicles(api.as_ref(), status, &mut stdout).await?,
        Some(Commands::Vehicle { id }) => cli::vehicle(api.as_ref(), &id, &mut stdout).await?,
        Some(Commands::Alerts) => cli::alerts(api.as_ref(), &mut stdout).await?,
        Some(Commands::Ack { id }) => cli::acknowledge(api.as_ref(), id, &mut stdout).await?,
        Some(Commands::Resolve { id }) => cli::resolve(api.as_ref(), id, &mut stdout).await?,
        Some(Commands::Fleet) => cli::fleet(api.as_ref(), &mut stdout).await?,
        Some(Commands::History { from, to, days }) => {
            let days = days.unwrap_or(config.display.history_days);
            cli::history(api.as_ref(), from, to, days, &mut stdout).await?
        }
        Some(Commands::Init { .. }) => {}
        None => {
            // Launch the dashboard
            let mut app = App::new(&config, api)?;
            app.run().await?;
        }
    }

    Ok(())
}
