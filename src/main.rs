use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use raysniper::{app, Config};

#[derive(Parser, Debug)]
#[command(version, about = "Raydium AMM v4 pool sniper for Solana")]
struct Args {
    /// Path to a TOML config file (otherwise the environment and .env are used)
    #[arg(long)]
    config: Option<String>,

    /// Log trades instead of sending transactions
    #[arg(long)]
    paper_trade: bool,

    /// Snipe list file (overrides config)
    #[arg(long)]
    snipe_list: Option<String>,

    /// Tracing filter, e.g. "info" or "raysniper=debug"
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    // Priority: --log-level > LOG_LEVEL / config file > RUST_LOG > info
    let filter = match args.log_level.as_deref().or(config.log_level.as_deref()) {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // CLI overrides
    if args.paper_trade {
        config.paper_trade = true;
    }
    if let Some(path) = args.snipe_list {
        config.snipe_list_path = path;
    }

    app::run(config).await
}
