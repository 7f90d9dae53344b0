use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use kbchat::config::AppConfig;
use kbchat::gateway::{ConnectivityProber, build_client, resolve_credential};
use kbchat::{logging, server};

#[derive(Parser, Debug)]
#[command(name = "kbchat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file (default: ./kbchat.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Serve mock completions instead of calling the upstream
    #[arg(long, global = true)]
    mock: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Check upstream LLM connectivity and exit
    Probe,
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigSubcommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Write a commented config template
    Init,
    /// Print the config file path
    Where,
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(AppConfig::get_config_path)
}

fn load_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::load(Some(&config_path(cli)));
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.mock {
        config.mock_openai = true;
    }
    config
}

async fn probe(config: &AppConfig) -> ExitCode {
    let settings = config.gateway_settings();
    let credential = resolve_credential(&settings);
    let client = match build_client(credential, &settings) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("✗ {e}");
            return ExitCode::FAILURE;
        }
    };

    let connectivity = ConnectivityProber::new(settings.mock_openai)
        .probe(&client)
        .await;
    println!("{connectivity}");

    if connectivity.is_available() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn config_command(cli: &Cli, command: &ConfigSubcommands) -> ExitCode {
    let path = config_path(cli);
    match command {
        ConfigSubcommands::Init => match AppConfig::init_default(&path) {
            Ok(()) => println!("✓ Created config file at {}", path.display()),
            Err(e) => {
                eprintln!("✗ Failed to create config: {e}");
                return ExitCode::FAILURE;
            }
        },
        ConfigSubcommands::Where => println!("{}", path.display()),
    }
    ExitCode::SUCCESS
}

async fn serve(config: &AppConfig) -> ExitCode {
    match server::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server startup failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_runtime(cli: &Cli) -> (Option<logging::LogGuard>, AppConfig) {
    dotenv::dotenv().ok();
    let log_guard = logging::init(cli.verbose);
    if let Some(path) = logging::log_file_path() {
        tracing::info!("Writing debug log to {}", path.display());
    }
    (log_guard, load_config(cli))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Config { command }) => config_command(&cli, command),
        Some(Commands::Probe) => {
            let (_log_guard, config) = init_runtime(&cli);
            probe(&config).await
        }
        None | Some(Commands::Serve) => {
            let (_log_guard, config) = init_runtime(&cli);
            serve(&config).await
        }
    }
}
