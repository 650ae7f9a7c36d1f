use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use networth::cache::SnapshotCache;
use networth::clock::{Clock, SystemClock};
use networth::config::{default_config_path, ResolvedConfig};
use networth::duration::parse_duration;
use networth::format::{format_amount, format_change, format_plain};
use networth::models::NetWorthSnapshot;
use networth::query::{change_30_days_at, QueryService};
use networth::refresh::RefreshScheduler;
use networth::server::{self, AppState};
use networth::shutdown::Shutdown;
use networth::storage::{HistoryStore, JsonFileHistoryStore};
use networth::sync::claim::claim_access_url;
use networth::sync::simplefin::DEFAULT_REQUEST_TIMEOUT;
use networth::sync::{AccountSource, SimpleFinClient};
use secrecy::ExposeSecret;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "networth")]
#[command(about = "Track net worth from SimpleFIN and serve it over HTTP")]
struct Cli {
    /// Path to config file.
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh on a timer and serve the latest figures over HTTP (default).
    Serve {
        /// Override the refresh interval (e.g. "30m", "4h").
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_arg)]
        interval: Option<Duration>,

        /// Override the random jitter applied to each interval.
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_arg)]
        jitter: Option<Duration>,
    },

    /// Run a single refresh and print the result.
    Once {
        /// Do not append the result to the history file.
        #[arg(long)]
        no_history: bool,
    },

    /// Exchange a SimpleFIN setup token for an access URL.
    Claim {
        /// Base64 setup token from the SimpleFIN Bridge.
        setup_token: String,
    },
}

fn parse_duration_arg(s: &str) -> std::result::Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<ResolvedConfig> {
    let mut config = ResolvedConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    config.apply_env()?;
    Ok(config)
}

fn simplefin_client(config: &ResolvedConfig) -> Result<Arc<dyn AccountSource>> {
    let client = SimpleFinClient::with_timeout(config.require_access_url()?, config.request_timeout)
        .context("Failed to set up SimpleFIN client")?;
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match &cli.command {
        None => serve(&cli, None, None).await,
        Some(Command::Serve { interval, jitter }) => serve(&cli, *interval, *jitter).await,
        Some(Command::Once { no_history }) => once(&cli, *no_history).await,
        Some(Command::Claim { setup_token }) => claim(setup_token).await,
    }
}

async fn serve(cli: &Cli, interval: Option<Duration>, jitter: Option<Duration>) -> Result<()> {
    let config = load_config(cli)?;
    let source = simplefin_client(&config)?;
    let history: Arc<dyn HistoryStore> = Arc::new(JsonFileHistoryStore::new(&config.history_file));
    let cache = Arc::new(SnapshotCache::new());

    let scheduler = Arc::new(
        RefreshScheduler::new(source, history.clone(), cache.clone())
            .with_fallback_currency(config.fallback_currency.clone()),
    );
    scheduler
        .initialize()
        .await
        .context("Initial refresh failed; refusing to serve without a snapshot")?;

    let shutdown = Shutdown::new();
    let refresh_task = scheduler.clone().spawn(
        interval.unwrap_or(config.refresh.interval),
        jitter.unwrap_or(config.refresh.jitter),
        shutdown.clone(),
    );

    let query = Arc::new(QueryService::new(cache, history));
    let router = server::router(AppState::new(query));
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    let signals = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown requested");
        signals.cancel();
    });

    server::serve(listener, router, shutdown.clone())
        .await
        .context("HTTP server failed")?;
    // Covers the server exiting for a reason other than a signal.
    shutdown.cancel();

    let grace = config.refresh.shutdown_grace;
    match tokio::time::timeout(grace, refresh_task).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "refresh task ended abnormally"),
        Err(_) => warn!(
            grace_ms = grace.as_millis() as u64,
            "refresh still running at exit; abandoning it"
        ),
    }

    info!("stopped");
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(err) => warn!(error = %err, "failed to install SIGTERM handler"),
        }
    }
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C");
    }
}

async fn once(cli: &Cli, no_history: bool) -> Result<()> {
    let config = load_config(cli)?;
    let source = simplefin_client(&config)?;
    let history = Arc::new(JsonFileHistoryStore::new(&config.history_file));

    let snapshot = if no_history {
        let accounts = source.fetch_accounts().await?;
        Arc::new(networth::networth::snapshot(
            &accounts,
            &config.fallback_currency,
            SystemClock.now(),
        )?)
    } else {
        RefreshScheduler::new(source, history.clone(), Arc::new(SnapshotCache::new()))
            .with_fallback_currency(config.fallback_currency.clone())
            .refresh_once()
            .await?
    };

    print_snapshot(&snapshot);

    if !no_history {
        match history.read_all().await {
            Ok(entries) => {
                match change_30_days_at(&entries, snapshot.net_worth, SystemClock.now()) {
                    Ok(Some(change)) => {
                        println!("30-day change: {}", format_change(change, &snapshot.currency));
                    }
                    Ok(None) => {}
                    Err(err) => warn!(error = %err, "failed to compute 30-day change"),
                }
            }
            Err(err) => warn!(error = %err, "failed to read net worth history"),
        }
    }

    Ok(())
}

fn print_snapshot(snapshot: &NetWorthSnapshot) {
    println!(
        "Net worth: {} {}",
        format_plain(snapshot.net_worth),
        snapshot.currency
    );
    println!("           {}", format_amount(snapshot.net_worth, &snapshot.currency));
    for account in &snapshot.accounts {
        println!("  {:<32} {:>16}", account.name, format_plain(account.balance));
    }
    for warning in &snapshot.warnings {
        println!("  warning: {warning}");
    }
}

async fn claim(setup_token: &str) -> Result<()> {
    let access_url = claim_access_url(setup_token, DEFAULT_REQUEST_TIMEOUT)
        .await
        .context("Failed to claim setup token")?;
    println!("{}", access_url.expose_secret());
    eprintln!("Store this as SIMPLEFIN_ACCESS_URL; the setup token cannot be claimed again.");
    Ok(())
}
