// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! fsbridge daemon executable

use anyhow::Context;
use clap::Parser;
use fsbridge_core::{BridgeConfig, FsBridge};
use fsbridge_logging::CliLoggingArgs;
use fsbridge_server::{BridgeServer, Router};
use std::path::PathBuf;
use tracing::info;

const COMPONENT: &str = "fsbridge-daemon";

#[derive(Parser)]
#[command(name = "fsbridge-daemon")]
#[command(about = "Serve local filesystem primitives over a Unix socket")]
#[command(version, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "FSBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Unix socket path (overrides configuration)
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Transfer chunk size in bytes (overrides configuration)
    #[arg(long)]
    chunk_size: Option<usize>,

    #[command(flatten)]
    logging: CliLoggingArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.logging.init(COMPONENT)?;

    let mut config = BridgeConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(socket) = cli.socket {
        config.socket_path = socket;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.transfer.chunk_size = chunk_size;
    }
    config.validate().context("invalid configuration")?;

    info!(
        component = COMPONENT,
        socket = %config.socket_path.display(),
        chunk_size = config.transfer.chunk_size,
        "starting"
    );

    let router = Router::new(FsBridge::local(config.transfer));
    BridgeServer::new(&config.socket_path, router)
        .run()
        .with_context(|| format!("server on {} failed", config.socket_path.display()))
}
