//! Chorus Router - persona router and chorus aggregator
//!
//! Entry point for the `chorus-router` binary. Serves the chat API, or
//! answers a single turn from the command line.

mod cli;
mod config;
mod error;
mod llm;
mod logging;
mod orchestrator;
mod persona;
mod server;
mod types;
mod version;

use std::io::Read;

use clap::Parser;
use serde_json::Value;
use tracing::{info, Level};

use crate::cli::{Cli, Commands, ConfigSubcommand};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::llm::create_backend;
use crate::orchestrator::{Mode, Orchestrator};
use crate::persona::PersonaRegistry;
use crate::types::{Conversation, HistoryEntry};

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            version::print_version();
            Ok(())
        }
        Commands::Personas => {
            print_personas();
            Ok(())
        }
        Commands::Config { subcommand } => {
            logging::init_simple(Level::WARN)?;
            handle_config_command(subcommand)
        }
        Commands::Chat {
            config,
            mode,
            provider,
            history,
        } => {
            // stdout carries the envelope, so keep logs terse and on stderr
            logging::init_simple(if cli.quiet {
                Level::ERROR
            } else if cli.verbose > 0 {
                Level::DEBUG
            } else {
                Level::WARN
            })?;

            let mut config = AppConfig::load(config.as_deref())?;
            if let Some(provider) = provider {
                config.llm.provider = provider;
            }
            run_chat(config, Mode::from_label(&mode), history.as_deref())
        }
        Commands::Serve { config, bind } => {
            let mut config = AppConfig::load(config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            // Held until exit so buffered file output is flushed
            let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

            let build = version::build_info();
            info!(
                version = %build.full_version(),
                target = %build.target,
                profile = %build.profile,
                "Starting Chorus Router"
            );
            run_server(config)
        }
    }
}

fn build_runtime(threads: usize) -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(threads)
        .thread_name("chorus-router")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))
}

fn run_server(config: AppConfig) -> Result<()> {
    info!(
        bind = %config.server.bind,
        provider = %config.llm.provider,
        default_persona = %config.routing.default_persona,
        parallel_fanout = config.routing.parallel_fanout,
        "Configuration loaded"
    );

    let backend = create_backend(&config.llm)?;
    let runtime = build_runtime(config.worker_threads())?;
    runtime.block_on(server::serve(&config, backend))
}

fn run_chat(config: AppConfig, mode: Mode, history_path: Option<&str>) -> Result<()> {
    let history = read_history(history_path)?;
    let conversation = Conversation::from_history(&history);

    let backend = create_backend(&config.llm)?;
    let orchestrator = Orchestrator::new(backend, &config.routing)?;

    let runtime = build_runtime(config.worker_threads())?;
    let envelope = runtime.block_on(orchestrator.handle(mode, &conversation))?;

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

/// History as a JSON array, or an object with a `history` array
fn read_history(path: Option<&str>) -> Result<Vec<HistoryEntry>> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.into(),
            source: e,
        })?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| Error::InvalidInput(format!("history is not valid JSON: {}", e)))?;
    let history = match value {
        Value::Array(_) => value,
        Value::Object(mut object) => match object.remove("history") {
            Some(history @ Value::Array(_)) => history,
            _ => return Err(Error::InvalidInput("history array is required".to_string())),
        },
        _ => return Err(Error::InvalidInput("history array is required".to_string())),
    };

    serde_json::from_value(history).map_err(|e| Error::InvalidInput(e.to_string()))
}

fn print_personas() {
    let registry = PersonaRegistry::new();
    println!("{:<10} {:<10} DESCRIPTION", "ID", "NAME");
    for profile in registry.profiles() {
        println!(
            "{:<10} {:<10} {}",
            profile.id.slug(),
            profile.display_name(),
            profile.description
        );
    }
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = AppConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration written to {}", written.display());
        }
        ConfigSubcommand::Validate { config } => {
            AppConfig::load(config.as_deref())?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
