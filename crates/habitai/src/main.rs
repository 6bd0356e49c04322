//! HabitAI server - HTTP backend for the habit coach

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use habitai_server::api::ApiServer;
use habitai_server::config::Config;
use habitai_server::error::Result;

/// HabitAI - LLM habit coach backend
#[derive(Parser)]
#[command(name = "habitai")]
#[command(about = "Backend API for the HabitAI habit coach")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the API server (default command)
    #[command(name = "serve")]
    Serve,

    /// Print the effective configuration and exit
    #[command(name = "config")]
    ShowConfig,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        None | Some(Command::Serve) => serve(config).await,
        Some(Command::ShowConfig) => {
            show_config(&config);
            Ok(())
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,habitai_server=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting HabitAI backend");
    tracing::debug!("Config loaded: {:?}", config);

    ApiServer::new(config).serve().await
}

fn show_config(config: &Config) {
    let credential = if config.upstream.api_key().is_some() {
        "set"
    } else {
        "missing"
    };

    println!("listen_addr      = {}", config.server.listen_addr);
    println!("api_url          = {}", config.upstream.api_url);
    println!("api_key_env      = {} ({credential})", config.upstream.api_key_env);
    println!("model            = {}", config.upstream.model);
    println!("timeout_secs     = {}", config.upstream.timeout_secs);
    println!("temperature      = {}", config.upstream.temperature);
    println!("max_tokens       = {}", config.upstream.max_tokens);
    println!("plan_max_tokens  = {}", config.upstream.plan_max_tokens);
    println!("retry delays_ms  = {:?}", config.retry.delays_ms);
    println!("history max      = {}", config.history.max_messages);
    println!("history recent   = {}", config.history.recent_default);
    println!("conversations    = {}", config.history.max_conversations);
}
