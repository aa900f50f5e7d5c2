//! # engine-cli
//!
//! Host-side tool for inspecting and driving SyncML engine modules.
//!
//! ## Commands
//!
//! - `info`: Connect a module and show its version
//! - `get`: Read a settings value by key path
//! - `set`: Write a settings value by key path
//! - `sync`: Run a sync session, exchanging messages through files
//!
//! ## Example
//!
//! ```bash
//! # Show the engine named in engine.toml
//! engine-cli info
//!
//! # Inspect and edit engine settings
//! engine-cli get /profiles/default server
//! engine-cli set /profiles/default server https://sync.example.org
//!
//! # Drive a session against the in-memory mock engine
//! engine-cli --mock sync
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use engine_api::{Engine, MockEngine};
use engine_bridge::EngineBridge;
use std::path::PathBuf;
use std::sync::Arc;

mod commands;
mod config;

use commands::Connected;
use config::Config;

/// Host-side tool for inspecting and driving SyncML engine modules.
#[derive(Parser, Debug)]
#[command(name = "engine-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "engine.toml")]
    config: PathBuf,

    /// Use the in-memory mock engine instead of loading a module
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show engine module information
    Info,

    /// Read a settings value
    Get {
        /// Settings key path
        path: String,
        /// Value name
        name: String,
    },

    /// Write a settings value
    Set {
        /// Settings key path
        path: String,
        /// Value name
        name: String,
        /// Value to write
        value: String,
        /// Write as a 32-bit integer instead of text
        #[arg(long)]
        int: bool,
    },

    /// Run a sync session, exchanging messages through files
    Sync {
        /// Profile selector
        #[arg(long, default_value = "0")]
        selector: u32,
        /// Session name
        #[arg(long)]
        name: Option<String>,
        /// Message exchange directory
        #[arg(long, default_value = "sync-exchange")]
        exchange: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let connected = connect(&config, cli.mock)?;

    match cli.command {
        Commands::Info => commands::info::run(&connected),
        Commands::Get { path, name } => commands::get::run(&connected.engine, &path, &name),
        Commands::Set {
            path,
            name,
            value,
            int,
        } => commands::set::run(&connected.engine, &path, &name, &value, int),
        Commands::Sync {
            selector,
            name,
            exchange,
        } => commands::sync::run(&connected.engine, selector, name.as_deref(), &exchange),
    }
}

/// Connect the configured engine module, or the in-process mock.
fn connect(config: &Config, mock: bool) -> Result<Connected> {
    let connected = if mock {
        Connected {
            engine: Engine::new(Arc::new(MockEngine::new())),
            module_name: "mock".to_string(),
            library: None,
            engine_version: None,
        }
    } else {
        let spec = config.module_spec()?;
        let library = spec.library_path();
        let bridge = EngineBridge::connect(&spec)
            .with_context(|| format!("failed to connect engine module {:?}", spec.name))?;
        let engine_version = bridge.engine_version();
        Connected {
            engine: Engine::new(Arc::new(bridge)),
            module_name: spec.name,
            library: Some(library),
            engine_version: Some(engine_version),
        }
    };

    if let Some(xml) = &config.engine.config_xml {
        connected
            .engine
            .init_engine_file(xml)
            .with_context(|| format!("failed to configure engine from {}", xml.display()))?;
    }
    Ok(connected)
}
