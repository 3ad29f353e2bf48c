use std::net::SocketAddr;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use rand::{SeedableRng, prelude::StdRng};
use tokio::{runtime::Builder, sync::mpsc};
use tracing::info;
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

use chef_load::{
    client::DataCollector,
    config::{self, Config},
    generator::{self, ChefActions},
};

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::Error),
    #[error("Chef-load generator returned an error: {0}")]
    Generator(#[from] generator::Error),
    #[error("Chef-load client returned an error: {0}")]
    Client(#[from] chef_load::client::Error),
    #[error("Failed to install Prometheus exporter: {0}")]
    Prometheus(#[from] metrics_exporter_prometheus::BuildError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Transmission worker panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

fn default_config_path() -> String {
    "/etc/chef-load/chef-load.yaml".to_string()
}

#[derive(Parser)]
#[command(version, about = "Stream synthetic chef actions at a data-collector endpoint")]
struct Opts {
    /// Path to the chef-load yaml config
    #[arg(long, default_value_t = default_config_path())]
    config_path: String,
    /// Print a sample config file to stdout and exit
    #[arg(long)]
    sample_config: bool,
    /// Override the configured number of actions
    #[arg(long)]
    num_actions: Option<u32>,
    /// Override the configured data-collector endpoint
    #[arg(long)]
    data_collector_url: Option<String>,
    /// Address to serve Prometheus metrics on
    #[arg(long)]
    prometheus_addr: Option<SocketAddr>,
}

async fn inner_main(opts: Opts) -> Result<(), Error> {
    let mut config = Config::from_path(&opts.config_path)?;
    if let Some(num_actions) = opts.num_actions {
        config.num_actions = num_actions;
    }
    if let Some(url) = opts.data_collector_url {
        config.data_collector_url = url;
    }

    if let Some(addr) = opts.prometheus_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::from_seed(seed),
        None => StdRng::from_os_rng(),
    };

    // The client is constructed before any event is generated so that a
    // misconfigured endpoint fails the whole run up front.
    let collector = DataCollector::new(&config.data_collector_url, &config.data_collector_token)?;
    let (snd, rcv) = mpsc::channel(config.queue_depth);
    let drain = tokio::spawn(collector.drain(rcv));

    let summary = ChefActions::new(&config, snd)?.spin(&mut rng).await?;
    let totals = drain.await?;

    info!(
        generated = summary.generated,
        submitted = summary.submitted,
        failed = summary.failed,
        delivered = totals.delivered,
        undelivered = totals.failed,
        "chef-load run complete"
    );
    Ok(())
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .finish()
        .init();

    let opts = Opts::parse();

    if opts.sample_config {
        println!("{}", Config::sample()?);
        return Ok(());
    }

    let version = env!("CARGO_PKG_VERSION");
    info!("Starting chef-load {version} run.");

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(inner_main(opts))
}
