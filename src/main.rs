use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use statuspro::config::{Config, load_config, load_config_from_path};
use statuspro::lifecycle::ProcessLifecycle;
use statuspro::logging::init_tracing;
use statuspro::system::SysinfoProvider;
use tokio::io::BufReader;

#[derive(Parser)]
#[command(
    name = "statuspro",
    version,
    about = "Local system status monitor with an interactive console and HTTP endpoint"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// TCP port for the HTTP server
    #[arg(long)]
    port: Option<u16>,

    /// Address the HTTP server binds to
    #[arg(long)]
    bind: Option<IpAddr>,

    /// File served for `/` and any path other than `/status`
    #[arg(long)]
    static_asset: Option<PathBuf>,

    /// Path whose filesystem is reported as disk usage
    #[arg(long)]
    disk_mount: Option<PathBuf>,

    /// Log filter, e.g. `info` or `statuspro=debug`
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

// A pending stdin read cannot be cancelled, so the runtime is not allowed to
// wait for it on the way out.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    init_tracing(&config.logging)?;
    tracing::debug!(?config, "configuration loaded");

    let provider = Arc::new(SysinfoProvider::new(config.metrics.cpu_sample_window()));
    let lifecycle = ProcessLifecycle::new(config, provider);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(lifecycle.run(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        interrupt(),
    ));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    let reason = result?;
    tracing::debug!(?reason, "exiting");
    Ok(())
}

async fn interrupt() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(ref asset) = cli.static_asset {
        config.server.static_asset = asset.clone();
    }
    if let Some(ref mount) = cli.disk_mount {
        config.metrics.disk_mount = mount.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.log_json {
        config.logging.json = true;
    }

    config
}
