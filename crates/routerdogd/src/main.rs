//! routerdogd — the routerdog daemon.
//!
//! Watches Internet reachability from the local network and power-cycles
//! the upstream router through an RF power socket when every configured
//! host has been unreachable for `threshold` consecutive checks.
//!
//! # Usage
//!
//! ```text
//! routerdogd run --config /etc/routerdog.toml
//! routerdogd check
//! routerdogd power-cycle --record
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use routerdog_actuator::select_actuator;
use routerdog_core::WatchdogConfig;
use routerdog_probe::{CheckOutcome, NetworkProber, ReachabilityChecker};
use routerdog_state::FileCooldownStore;
use routerdog_watchdog::{RestartEngine, RestartPolicy, Watchdog};

#[derive(Parser)]
#[command(name = "routerdogd", about = "Router watchdog daemon", version)]
struct Cli {
    /// Path to routerdog.toml. Built-in defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Switch the router on, then watch connectivity until interrupted.
    Run,
    /// Run a single check cycle and print the outcome.
    Check,
    /// Send the ON signal once.
    PowerOn,
    /// Power-cycle the router now.
    PowerCycle {
        /// Record the restart so the cooldown applies to the watchdog.
        #[arg(long)]
        record: bool,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = WatchdogConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run => run(config).await,
        Command::Check => check(&config).await,
        Command::PowerOn => {
            build_engine(&config).power_on().await;
            Ok(())
        }
        Command::PowerCycle { record } => power_cycle(&config, record).await,
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,routerdog=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn build_checker(config: &WatchdogConfig) -> ReachabilityChecker {
    let prober = Arc::new(NetworkProber::new(config.timeout));
    ReachabilityChecker::from_config(prober, config)
}

fn build_engine(config: &WatchdogConfig) -> RestartEngine {
    let store = Arc::new(FileCooldownStore::new(config.state_file.clone()));
    let actuator = select_actuator(&config.actuator);
    RestartEngine::new(RestartPolicy::from_config(config), store, actuator)
}

async fn run(config: WatchdogConfig) -> anyhow::Result<()> {
    info!(
        hosts = config.hosts.len(),
        state_file = %config.state_file.display(),
        "routerdog starting"
    );

    let watchdog = Watchdog::from_config(build_checker(&config), build_engine(&config), &config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    watchdog.run(shutdown_rx).await;

    info!("exiting");
    Ok(())
}

async fn check(config: &WatchdogConfig) -> anyhow::Result<()> {
    match build_checker(config).check().await {
        CheckOutcome::Reachable { host, attempt } => {
            println!("reachable: {host} answered (attempt {})", attempt + 1);
        }
        CheckOutcome::AllUnreachable => {
            println!(
                "unreachable: none of {} hosts answered in {} attempt(s)",
                config.hosts.len(),
                config.retries + 1
            );
        }
    }
    Ok(())
}

async fn power_cycle(config: &WatchdogConfig, record: bool) -> anyhow::Result<()> {
    if record {
        build_engine(config).restart().await;
    } else {
        let actuator = select_actuator(&config.actuator);
        if let Err(e) = actuator.power_cycle().await {
            anyhow::bail!("power cycle failed: {e}");
        }
    }
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
