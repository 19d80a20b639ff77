//! binhammer Binary
//!
//! Drives a load run against a cache server.

use std::sync::Arc;
use std::time::Duration;

use binhammer::config::{Config, Dispatch, KeyMode};
use binhammer::workload::parse_sequence;
use binhammer::{Controller, TcpConnector};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

/// binhammer
#[derive(Parser, Debug)]
#[command(name = "binhammer")]
#[command(about = "Load generator for binary-protocol cache servers")]
#[command(version)]
struct Args {
    /// Layer 3 protocol (tcp, tcp4, tcp6)
    #[arg(long, default_value = "tcp")]
    prot: String,

    /// Host:port to connect to
    #[arg(long, default_value = "localhost:11211")]
    dest: String,

    /// Number of concurrent clients
    #[arg(short, long, default_value = "32")]
    concurrency: usize,

    /// Number of keys
    #[arg(short, long, default_value = "1000000")]
    keys: u64,

    /// Number of bytes of value
    #[arg(short, long, default_value = "20")]
    bodylen: usize,

    /// Stop after this many seconds (runs until interrupted when unset)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Operation sequence, e.g. insert,fetch,delete
    #[arg(long, default_value = "insert,fetch,delete")]
    ops: String,

    /// How operations are assigned to keys
    #[arg(long, value_enum, default_value = "cycle")]
    mode: ModeArg,

    /// Feed all workers from one shared queue instead of key partitions
    /// (not available with `--mode stateful`)
    #[arg(long)]
    shared: bool,

    /// Shared queue capacity
    #[arg(long, default_value = "100")]
    queue_depth: usize,

    /// Seconds between throughput reports
    #[arg(long, default_value = "5")]
    report_interval: u64,

    /// Requests in flight per connection
    #[arg(long, default_value = "1")]
    pipeline: usize,

    /// Use quiet opcodes with a NOOP fence (requires --pipeline > 1)
    #[arg(long)]
    quiet: bool,

    /// Seed for key permutations
    #[arg(long)]
    seed: Option<u64>,

    /// Socket read/write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Cycle,
    Stateful,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,binhammer=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("binhammer v{}", binhammer::VERSION);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };

    let controller = match Controller::new(config) {
        Ok(controller) => controller,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };

    // Ctrl+C raises the stop signal; workers finish their in-flight operation
    let stop = controller.stop_signal();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, stopping workers...");
        stop.raise();
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let connector = Arc::new(TcpConnector::from_config(controller.config()));
    if let Err(e) = controller.run(connector) {
        tracing::error!("Run failed: {}", e);
        std::process::exit(1);
    }
}

fn build_config(args: &Args) -> binhammer::Result<Config> {
    let mut builder = Config::builder()
        .protocol(&args.prot)
        .address(&args.dest)
        .concurrency(args.concurrency)
        .key_count(args.keys)
        .value_size(args.bodylen)
        .sequence(parse_sequence(&args.ops)?)
        .key_mode(match args.mode {
            ModeArg::Cycle => KeyMode::Cycle,
            ModeArg::Stateful => KeyMode::Stateful,
        })
        .report_interval(Duration::from_secs(args.report_interval))
        .pipeline_depth(args.pipeline)
        .quiet(args.quiet);

    if args.shared {
        builder = builder.dispatch(Dispatch::Shared { queue_depth: args.queue_depth });
    }
    if let Some(secs) = args.duration {
        builder = builder.duration(Duration::from_secs(secs));
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    if args.timeout_ms > 0 {
        let timeout = Duration::from_millis(args.timeout_ms);
        builder = builder.read_timeout(timeout).write_timeout(timeout);
    }

    Ok(builder.build())
}
