//! cachipfs-node - IPFS gateway that drives the local `ipfs` daemon
//!
//! Subcommands:
//! - `cachipfs-node serve` - Run the HTTP gateway
//! - `cachipfs-node add <file>` - Add a file and print its CID
//! - `cachipfs-node probe <cid>` - Check whether a CID can be read
//! - `cachipfs-node get <cid>` - Fetch a CID to a file or stdout
//! - `cachipfs-node config` - Show the effective configuration

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use cachiconf::NodeConfig;
use cachipfs::StoreClient;
use cachipfs_node::{commands, serve, settings, telemetry};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "cachipfs-node")]
#[command(about = "IPFS gateway backed by the local ipfs daemon")]
#[command(version)]
struct Cli {
    /// Config file (replaces ./cachipfs.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Host to bind (overrides bind.host)
        #[arg(long)]
        host: Option<String>,

        /// HTTP port to bind (overrides bind.http_port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Add a file and print its CID
    Add {
        /// File to add
        file: PathBuf,
    },

    /// Check whether a CID can be read; exits 1 when it cannot
    Probe {
        cid: String,

        /// Daemon timeout, e.g. 500ms, 5s, 1m
        #[arg(short, long)]
        timeout: Option<String>,
    },

    /// Fetch a CID
    Get {
        cid: String,

        /// Daemon timeout, e.g. 500ms, 5s, 1m
        #[arg(short, long)]
        timeout: Option<String>,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the effective configuration and its sources
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let (config, sources) = NodeConfig::load_with_sources_from(cli.config.as_deref())?;

    if let Commands::Config = cli.command {
        print!("{}", commands::show_config(&config, &sources));
        return Ok(ExitCode::SUCCESS);
    }

    let guard = telemetry::init(&config.telemetry)?;
    let result = run(cli.command, config).await;
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    // Flush exporters on every path, failures included
    guard.shutdown();
    result
}

async fn run(command: Commands, mut config: NodeConfig) -> Result<ExitCode> {
    let store = StoreClient::spawning(settings::store_config(&config)?);

    match command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.bind.host = host;
            }
            if let Some(port) = port {
                config.bind.http_port = port;
            }

            let shutdown = CancellationToken::new();
            serve::spawn_signal_handler(shutdown.clone());
            serve::run(store, &config.bind.addr(), shutdown).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Add { file } => {
            commands::add(&store, &file).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Probe { cid, timeout } => {
            if commands::probe(&store, &cid, timeout.as_deref()).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Get {
            cid,
            timeout,
            output,
        } => {
            commands::get(&store, &cid, timeout.as_deref(), output).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => Ok(ExitCode::SUCCESS),
    }
}
