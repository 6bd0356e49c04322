pub mod client;
pub mod commands;
pub mod error;
pub mod output;

pub use client::{CoachClient, DEFAULT_SERVER_URL};
pub use commands::{
    AnalyzeCommand, ChatCommand, ContextArgs, HealthCommand, HistoryCommand, PlanCommand,
    ResetCommand,
};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, truncate_string};
