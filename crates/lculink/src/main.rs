// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use lculink::config::LcuConfig;

#[derive(Debug, Parser)]
#[command(name = "lculink", version, about = "Follow League Client events and query its API")]
struct Cli {
    #[command(flatten)]
    lcu: LcuConfig,

    /// Perform one authenticated GET against this path and print the JSON.
    #[arg(long)]
    get: Option<String>,

    /// Log filter directive.
    #[arg(long, default_value = "info", env = "LCU_LOG_LEVEL")]
    log_level: String,

    /// Log format: `text` or `json`.
    #[arg(long, default_value = "text", env = "LCU_LOG_FORMAT")]
    log_format: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);
    let _ = rustls::crypto::ring::default_provider().install_default();

    let result = match cli.get {
        Some(ref path) => lculink::get_once(&cli.lcu, path).await,
        None => lculink::run(cli.lcu).await,
    };
    if let Err(e) = result {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match cli.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().init(),
        _ => fmt::fmt().with_env_filter(filter).init(),
    }
}
