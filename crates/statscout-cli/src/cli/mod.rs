//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use statscout_core::client::ApiClient;
use statscout_core::config::{Config, paths};
use statscout_core::logging::{self, WorkerGuard};

mod commands;

#[derive(Parser)]
#[command(name = "statscout")]
#[command(version)]
#[command(about = "StatsScout cricket analyst in your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend base URL (overrides STATSCOUT_API_URL and the config file)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Asks a single question and prints the answer
    Ask {
        /// The question to send
        #[arg(short, long)]
        prompt: String,
    },
    /// Shows live, upcoming, and recent matches
    Matches,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, api_url } = cli;

    match command {
        None => {
            let backend = Backend::connect(api_url.as_deref())?;
            commands::chat::run(&backend.client, &backend.config).await
        }
        Some(Commands::Ask { prompt }) => {
            let backend = Backend::connect(api_url.as_deref())?;
            commands::ask::run(&backend.client, &prompt).await
        }
        Some(Commands::Matches) => {
            let backend = Backend::connect(api_url.as_deref())?;
            commands::matches::run(&backend.client).await
        }
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}

/// Loaded config, backend client, and the log writer guard for one command.
struct Backend {
    config: Config,
    client: ApiClient,
    _log_guard: Option<WorkerGuard>,
}

impl Backend {
    fn connect(api_url: Option<&str>) -> Result<Self> {
        let config = Config::load().context("load config")?;
        let log_guard = match logging::init(&paths::logs_dir(), &config.log_filter) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Warning: logging disabled: {e:#}");
                None
            }
        };

        let client_config = config
            .client_config(api_url)
            .context("resolve backend settings")?;
        let client = ApiClient::new(client_config).context("create backend client")?;
        tracing::debug!(base_url = client.base_url(), "Backend client ready");

        Ok(Self {
            config,
            client,
            _log_guard: log_guard,
        })
    }
}
