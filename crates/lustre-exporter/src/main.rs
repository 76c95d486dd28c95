//! lustre_exporter - Prometheus exporter for Lustre filesystem nodes.
//!
//! Serves metrics read from `/sys/fs/lustre` and `lctl get_param` on an HTTP
//! endpoint, collecting fresh values on every scrape.

mod handlers;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{ArgAction, Parser, ValueEnum};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use lustre_core::collector::{Collector, RealFs, SudoRunner};
use lustre_core::config::{ExporterConfig, Selection};
use lustre_core::metrics::{render_metrics, render_scrape_report};

use state::{ExporterState, Scraper};

/// Output format of `--once`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Prometheus exporter for Lustre.
#[derive(Parser)]
#[command(name = "lustre_exporter", about = "Prometheus exporter for Lustre filesystem nodes", version)]
struct Args {
    /// Address to listen on for the web interface and telemetry.
    #[arg(long = "web.listen-address", default_value = "0.0.0.0:9169", env = "LUSTRE_EXPORTER_LISTEN")]
    listen_address: String,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", default_value = "/metrics")]
    telemetry_path: String,

    /// Health check collection level (disabled, core, extended).
    #[arg(long = "collector.health", default_value = "extended", env = "LUSTRE_COLLECTOR_HEALTH")]
    health: Selection,

    /// OST metrics collection level (disabled, core, extended).
    #[arg(long = "collector.ost", default_value = "extended", env = "LUSTRE_COLLECTOR_OST")]
    ost: Selection,

    /// MDT metrics collection level (disabled, core, extended).
    /// Changelog metrics are collected only at the extended level.
    #[arg(long = "collector.mdt", default_value = "extended", env = "LUSTRE_COLLECTOR_MDT")]
    mdt: Selection,

    /// MGS metrics collection level (disabled, core, extended).
    #[arg(long = "collector.mgs", default_value = "extended", env = "LUSTRE_COLLECTOR_MGS")]
    mgs: Selection,

    /// Client metrics collection level (disabled, core, extended).
    #[arg(long = "collector.client", default_value = "extended", env = "LUSTRE_COLLECTOR_CLIENT")]
    client: Selection,

    /// Root of the sysfs mount.
    #[arg(long = "path.sys", default_value = "/sys")]
    sys_path: PathBuf,

    /// Run `sudo lctl get_param`; when false, read captured output from --path.lctl-replay.
    #[arg(long = "lctl.command-mode", default_value_t = true, action = ArgAction::Set)]
    lctl_command_mode: bool,

    /// Directory holding captured `lctl get_param` output.
    #[arg(long = "path.lctl-replay", default_value = "lctl")]
    lctl_replay_root: PathBuf,

    /// Prefix of every exposed metric name.
    #[arg(long, default_value = "lustre")]
    namespace: String,

    /// Run one collection cycle, print it and exit.
    #[arg(long)]
    once: bool,

    /// Output format for --once.
    #[arg(long, value_enum, default_value = "text", requires = "once")]
    format: OutputFormat,

    /// Increase verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Args {
    fn exporter_config(&self) -> ExporterConfig {
        ExporterConfig {
            health: self.health,
            ost: self.ost,
            mdt: self.mdt,
            mgs: self.mgs,
            client: self.client,
            sys_path: self.sys_path.clone(),
            lctl_command_mode: self.lctl_command_mode,
            lctl_replay_root: self.lctl_replay_root.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for crate_name in ["lustre_exporter", "lustre_core"] {
        if let Ok(directive) = format!("{}={}", crate_name, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let config = args.exporter_config();
    info!("lustre_exporter {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Collectors: health={}, ost={}, mdt={}, mgs={}, client={}",
        config.health, config.ost, config.mdt, config.mgs, config.client
    );
    info!(
        "Paths: lustre={}, lctl={}",
        config.lustre_path().display(),
        if config.lctl_command_mode {
            "sudo lctl".to_string()
        } else {
            config.lctl_replay_root.display().to_string()
        }
    );

    let collector = Collector::new(RealFs::new(), SudoRunner::new(), &config);

    if args.once {
        process::exit(run_once(&collector, &config.namespace, args.format));
    }

    if let Err(e) = handlers::validate_telemetry_path(&args.telemetry_path) {
        error!("{}", e);
        process::exit(2);
    }

    let addr: SocketAddr = match args.listen_address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(address = %args.listen_address, error = %e, "invalid listen address");
            process::exit(2);
        }
    };

    let state = Arc::new(ExporterState {
        scraper: Box::new(collector),
        namespace: config.namespace,
        telemetry_path: args.telemetry_path,
    });

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(serve(addr, state)) {
        error!(error = %e, "server error");
        process::exit(1);
    }
}

async fn serve(addr: SocketAddr, state: state::SharedState) -> std::io::Result<()> {
    let telemetry_path = state.telemetry_path.clone();
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, path = %telemetry_path, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("lustre_exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, stopping...");
}

/// Runs a single cycle and prints it to stdout. Returns the exit code,
/// non-zero when any source failed.
fn run_once(scraper: &dyn Scraper, namespace: &str, format: OutputFormat) -> i32 {
    let scrape = scraper.scrape();

    match format {
        OutputFormat::Text => {
            print!("{}", render_metrics(namespace, &scrape.measurements));
            print!("{}", render_scrape_report(namespace, &scrape.report));
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&scrape.measurements) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!(error = %e, "failed to serialize measurements");
                return 1;
            }
        },
    }

    info!(
        measurements = scrape.report.measurements,
        elapsed_ms = scrape.report.total.as_millis() as u64,
        "collection complete"
    );
    if scrape.report.is_complete() { 0 } else { 1 }
}
