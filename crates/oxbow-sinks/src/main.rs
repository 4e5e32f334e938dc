//! oxbow-sinks - Record sink runner
//!
//! # Architecture
//!
//! Lines read from stdin become records delivered to the single bound
//! sink. The sink kind is chosen in configuration, bound once at startup,
//! and initialized before the first record.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │    stdin    │────▶│ SinkRegistry │────▶│     Sink     │
//! │  (records)  │     │  (one slot)  │     │ console/wasm │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! # Feed stdin lines to the configured sink
//! oxbow-sinks -c sink.yaml run
//!
//! # Validate configuration
//! oxbow-sinks -c sink.yaml validate
//!
//! # List available sink kinds
//! oxbow-sinks sinks
//! ```

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use oxbow_sinks::config::{RunnerConfig, SINK_KINDS};
use oxbow_sinks::{ConsoleSink, Sink, SinkRegistry, WasmSink, WasmSinkConfig};

#[derive(Parser)]
#[command(name = "oxbow-sinks")]
#[command(version, about = "Record sink runner with sandboxed WebAssembly sinks")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sink.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Deliver stdin lines to the configured sink (default)
    Run {
        /// Key attached to every record
        #[arg(long)]
        key: Option<String>,
    },
    /// Validate configuration file
    Validate,
    /// List available sink kinds
    Sinks,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Commands that don't need config
    if let Some(Commands::Sinks) = &cli.command {
        return list_sinks();
    }

    let config = RunnerConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    match cli.command.unwrap_or(Commands::Run { key: None }) {
        Commands::Run { key } => run(config, key),
        Commands::Validate => validate_config(config),
        Commands::Sinks => unreachable!(), // handled above
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

fn bind_sink(registry: &SinkRegistry, kind: &str) -> Result<()> {
    match kind {
        "console" => registry.register("console", ConsoleSink::new()),
        "wasm" => registry.register("wasm", WasmSink::new()),
        other => bail!("unknown sink kind `{}`", other),
    }
    Ok(())
}

fn run(config: RunnerConfig, key: Option<String>) -> Result<()> {
    info!("Starting oxbow-sinks");

    let registry = SinkRegistry::new();
    bind_sink(&registry, &config.sink)?;

    let bound = registry.get().context("no sink bound")?;
    info!("Starting sink: {}", bound.name());

    let init_payload = config.config_bytes()?;
    bound
        .sink()
        .init(&init_payload)
        .with_context(|| format!("Failed to initialize sink '{}'", bound.name()))?;

    let key_bytes = key.map(String::into_bytes).unwrap_or_default();
    let headers = BTreeMap::new();

    let mut produced = 0u64;
    let mut failed = 0u64;
    for line in std::io::stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        match bound.sink().produce(&key_bytes, line.as_bytes(), &headers) {
            Ok(resp) => {
                produced += 1;
                info!("Delivered record ({} bytes)", resp.bytes_written);
            }
            Err(e) => {
                failed += 1;
                error!("Record rejected: {}", e);
            }
        }
    }

    if let Err(e) = bound.sink().close() {
        warn!("Sink close failed: {}", e);
    }

    info!("Done: {} delivered, {} rejected", produced, failed);
    Ok(())
}

fn validate_config(config: RunnerConfig) -> Result<()> {
    println!("✓ Configuration valid!\n");

    println!("Sink: {}", config.sink);
    if config.sink == "wasm" {
        let wasm_config: WasmSinkConfig = serde_yaml::from_value(config.config.clone())
            .context("Invalid wasm sink settings")?;
        println!("  Module: {}", wasm_config.module_path.display());
        println!(
            "  Stdout: {}",
            if wasm_config.bind_stdout {
                "bound to host"
            } else {
                "discarded"
            }
        );
    }

    Ok(())
}

/// List available sink kinds
fn list_sinks() -> Result<()> {
    println!("Available sink kinds:\n");
    println!("{:<10} Description", "Name");
    println!("──────────────────────────────────────────────────────");

    for kind in SINK_KINDS {
        let desc = match *kind {
            "console" => "Write record values to stdout",
            "wasm" => "Deliver records to a sandboxed WebAssembly module",
            _ => "",
        };
        println!("{:<10} {}", kind, desc);
    }

    Ok(())
}
