//! Command-line interface (clap derive)

use clap::{Parser, Subcommand};

/// Chorus Router - persona router and chorus aggregator
///
/// Answers a conversation turn either as one of four personas or as a
/// chorus of all of them, backed by a hosted LLM.
#[derive(Parser, Debug)]
#[command(name = "chorus-router")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service until Ctrl+C
    Serve {
        /// Path to configuration file
        #[arg(short, long, env = "CHORUS_CONFIG")]
        config: Option<String>,

        /// Listen address, overrides the configured one
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Answer one turn from a JSON history and print the envelope
    Chat {
        /// Path to configuration file
        #[arg(short, long, env = "CHORUS_CONFIG")]
        config: Option<String>,

        /// Which entry point answers the turn
        #[arg(short, long, default_value = "router", value_parser = ["router", "aggregator"])]
        mode: String,

        /// LLM provider override (gemini, openai, mock)
        #[arg(short, long)]
        provider: Option<String>,

        /// History file (`[{"role": ..., "content": ...}]`); reads stdin when omitted
        #[arg(long)]
        history: Option<String>,
    },

    /// List the personas
    Personas,

    /// Display version and build information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Write a default configuration file
    Init {
        /// Where to create the file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::parse_from(["chorus-router", "serve"]);
        match cli.command {
            Commands::Serve { config, bind } => {
                assert!(config.is_none());
                assert!(bind.is_none());
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_serve_with_bind() {
        let cli = Cli::parse_from(["chorus-router", "serve", "--bind", "0.0.0.0:9000"]);
        match cli.command {
            Commands::Serve { bind, .. } => assert_eq!(bind.as_deref(), Some("0.0.0.0:9000")),
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_chat_defaults_to_router() {
        let cli = Cli::parse_from(["chorus-router", "chat", "--provider", "mock"]);
        match cli.command {
            Commands::Chat { mode, provider, history, .. } => {
                assert_eq!(mode, "router");
                assert_eq!(provider.as_deref(), Some("mock"));
                assert!(history.is_none());
            }
            _ => panic!("Expected Chat command"),
        }
    }

    #[test]
    fn test_chat_rejects_unknown_mode() {
        let result = Cli::try_parse_from(["chorus-router", "chat", "--mode", "solo"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_chat_aggregator_with_history() {
        let cli = Cli::parse_from([
            "chorus-router",
            "chat",
            "--mode",
            "aggregator",
            "--history",
            "turns.json",
        ]);
        match cli.command {
            Commands::Chat { mode, history, .. } => {
                assert_eq!(mode, "aggregator");
                assert_eq!(history.as_deref(), Some("turns.json"));
            }
            _ => panic!("Expected Chat command"),
        }
    }

    #[test]
    fn test_verbose_and_quiet() {
        let cli = Cli::parse_from(["chorus-router", "-vv", "personas"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);

        let cli = Cli::parse_from(["chorus-router", "--quiet", "version"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["chorus-router", "config", "init", "--force"]);
        match cli.command {
            Commands::Config { subcommand: ConfigSubcommand::Init { path, force } } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
