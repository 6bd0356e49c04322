use clap::{Parser, Subcommand};
use habitai_cli::client::{CoachClient, DEFAULT_SERVER_URL};
use habitai_cli::commands::{
    AnalyzeCommand, ChatCommand, HealthCommand, HistoryCommand, PlanCommand, ResetCommand,
};
use habitai_cli::error::CliResult;
use habitai_cli::output::OutputFormat;

#[derive(Parser)]
#[command(name = "habitai-cli")]
#[command(about = "HabitAI CLI - Talk to the habit coach from the terminal")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(
        long,
        short,
        global = true,
        default_value = DEFAULT_SERVER_URL,
        help = "Base URL of the HabitAI server"
    )]
    pub server: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Send a chat message to the coach")]
    Chat(ChatCommand),

    #[clap(about = "Create a Tiny Habits plan")]
    Plan(PlanCommand),

    #[clap(about = "Analyze a missed day")]
    Analyze(AnalyzeCommand),

    #[clap(about = "Show recent messages of a conversation")]
    History(HistoryCommand),

    #[clap(about = "Clear a conversation's history")]
    Reset(ResetCommand),

    #[clap(about = "Check that the server is up")]
    Health(HealthCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let client = CoachClient::new(&cli.server)?;

    match &cli.command {
        Command::Chat(cmd) => cmd.execute(&client, format).await,
        Command::Plan(cmd) => cmd.execute(&client, format).await,
        Command::Analyze(cmd) => cmd.execute(&client, format).await,
        Command::History(cmd) => cmd.execute(&client, format).await,
        Command::Reset(cmd) => cmd.execute(&client, format).await,
        Command::Health(cmd) => cmd.execute(&client, format).await,
    }
}
