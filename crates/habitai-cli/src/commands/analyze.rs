use clap::Parser;

use crate::client::CoachClient;
use crate::commands::ContextArgs;
use crate::error::CliResult;
use crate::output::{OutputFormat, print_json};

#[derive(Parser)]
pub struct AnalyzeCommand {
    #[clap(help = "Why the day was missed")]
    pub reason: String,

    #[clap(flatten)]
    pub context: ContextArgs,
}

impl AnalyzeCommand {
    pub async fn execute(&self, client: &CoachClient, format: OutputFormat) -> CliResult<()> {
        let analysis = client
            .analyze_missed(&self.reason, &self.context.to_context())
            .await?;

        match format {
            OutputFormat::Json => print_json(&serde_json::json!({ "analysis": analysis }))?,
            OutputFormat::Table => println!("{analysis}"),
        }

        Ok(())
    }
}
