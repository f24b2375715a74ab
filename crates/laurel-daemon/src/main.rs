// crates/laurel-daemon/src/main.rs
//
// Binary entrypoint for the Laurel staking daemon.
//
// Parses CLI arguments, loads configuration, initializes tracing, opens the
// ledger, wires the ownership verifier, and serves the staking RPC API until
// interrupted.

mod config;
mod ownership_client;

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use config::DaemonConfig;
use ownership_client::HttpOwnershipVerifier;

use laurel_core::{LedgerStore, OwnershipVerifier, SystemClock};
use laurel_rpc::{LaurelRpcServer, RpcConfig};
use laurel_staking::{StakingService, StaticOwnershipRegistry};
use laurel_store::{InMemoryLedger, RocksLedger};

/// Laurel daemon: serves badge staking and points accrual.
#[derive(Parser, Debug)]
#[command(name = "laurel-daemon", version, about = "Laurel badge staking daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.laurel/config.toml")]
    config: String,

    /// Ledger backend override: rocks or memory.
    #[arg(long)]
    store: Option<String>,

    /// RPC port override.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration before tracing so the configured level applies;
    // a missing file falls back to defaults.
    let config_path = expand_tilde(&args.config);
    let loaded = DaemonConfig::load(&config_path);
    let mut daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", config_path),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    // CLI flags override the config file.
    if let Some(store) = args.store {
        daemon_config.store = store;
    }
    if let Some(port) = args.port {
        daemon_config.rpc_port = port;
    }
    daemon_config.validate()?;

    tracing::info!("Laurel Daemon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", daemon_config.data_dir);
    tracing::info!("Ledger backend: {}", daemon_config.store);
    tracing::info!(
        "Accrual: {} points per {}s",
        daemon_config.staking.rate_per_day,
        daemon_config.staking.one_day_secs
    );
    tracing::info!(
        "RPC endpoint: {}:{}",
        daemon_config.rpc_host,
        daemon_config.rpc_port
    );

    let store = open_ledger(&daemon_config)?;
    let verifier = build_verifier(&daemon_config)?;

    let service = StakingService::new(
        store,
        verifier,
        Arc::new(SystemClock),
        daemon_config.staking.clone(),
    )?;

    let rpc_config = RpcConfig {
        host: daemon_config.rpc_host.clone(),
        port: daemon_config.rpc_port,
    };
    let server = LaurelRpcServer::new(rpc_config, Arc::new(service))
        .with_store_backend(daemon_config.store.clone())
        .with_start_time(Instant::now());

    tokio::select! {
        result = server.start() => {
            if let Err(e) = result {
                tracing::error!("RPC server error: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
        }
    }

    tracing::info!("Laurel Daemon stopped");
    Ok(())
}

/// Open the configured ledger backend.
fn open_ledger(config: &DaemonConfig) -> Result<Arc<dyn LedgerStore>, Box<dyn std::error::Error>> {
    match config.store.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory ledger; stake state is lost on exit");
            Ok(Arc::new(InMemoryLedger::new()))
        }
        _ => {
            let data_dir = expand_tilde(&config.data_dir);
            std::fs::create_dir_all(&data_dir)?;
            let db_path = format!("{}/ledger_rocksdb", data_dir);
            let ledger = RocksLedger::open(&db_path)?;
            tracing::info!("RocksDB ledger opened at {}", db_path);
            Ok(Arc::new(ledger))
        }
    }
}

/// Build the ownership verifier: the remote service if configured, else the
/// static development registry.
fn build_verifier(
    config: &DaemonConfig,
) -> Result<Arc<dyn OwnershipVerifier>, Box<dyn std::error::Error>> {
    let ownership = &config.ownership;
    match &ownership.endpoint {
        Some(endpoint) => {
            tracing::info!("Ownership verification via {}", endpoint);
            Ok(Arc::new(HttpOwnershipVerifier::new(
                endpoint,
                Duration::from_millis(ownership.timeout_ms),
            )?))
        }
        None => {
            let registry = StaticOwnershipRegistry::from_pairs(
                ownership
                    .dev_owners
                    .iter()
                    .map(|(token, owner)| (token.as_str(), owner.as_str())),
            )?;
            tracing::warn!(
                "No ownership endpoint configured; using {} development owner entries",
                registry.len()
            );
            Ok(Arc::new(registry))
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}
