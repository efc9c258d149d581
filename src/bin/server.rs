//! todokv Server Binary
//!
//! Starts the HTTP server for todokv.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use todokv::config::SyncStrategy;
use todokv::http::{shutdown_signal, Server};
use todokv::{Config, ItemStore, LogStore, MemoryStore};
use tracing_subscriber::{fmt, EnvFilter};

/// todokv Server
#[derive(Parser, Debug)]
#[command(name = "todokv-server")]
#[command(about = "To-do list store over HTTP with JSON and protobuf encodings")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./todokv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    listen: String,

    /// Keep items in memory only (nothing is persisted)
    #[arg(long)]
    in_memory: bool,

    /// When to fsync the item log
    #[arg(long, value_enum, default_value = "every-write")]
    sync: SyncMode,

    /// Entries between fsyncs with `--sync every-n`
    #[arg(long, default_value = "100")]
    sync_every: usize,

    /// Longest accepted item text, in characters
    #[arg(long, default_value = "1024")]
    max_text_len: usize,

    /// Compact the log after this many records (0 disables)
    #[arg(long, default_value = "10000")]
    compaction_threshold: u64,

    /// Largest accepted request body in KiB
    #[arg(long, default_value = "64")]
    max_body_kb: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SyncMode {
    EveryWrite,
    EveryN,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,todokv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("todokv Server v{}", todokv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let sync_strategy = match args.sync {
        SyncMode::EveryWrite => SyncStrategy::EveryWrite,
        SyncMode::EveryN => SyncStrategy::EveryNEntries {
            count: args.sync_every,
        },
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .sync_strategy(sync_strategy)
        .max_text_len(args.max_text_len)
        .compaction_threshold(args.compaction_threshold)
        .max_body_bytes(args.max_body_kb * 1024)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // Open store
    let store: Arc<dyn ItemStore> = if args.in_memory {
        tracing::info!("Using in-memory store; items will not survive a restart");
        Arc::new(MemoryStore::with_max_text_len(config.max_text_len))
    } else {
        tracing::info!("Data directory: {}", args.data_dir);
        match LogStore::open(config.clone()) {
            Ok(store) => {
                tracing::info!("Store opened with {} items", store.item_count());
                Arc::new(store)
            }
            Err(e) => {
                tracing::error!("Failed to open store: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Start server
    let server = Server::new(config, store);
    if let Err(e) = server.run(shutdown_signal()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
