use clap::Parser;

use crate::client::CoachClient;
use crate::commands::ContextArgs;
use crate::error::CliResult;
use crate::output::{OutputFormat, print_json};

#[derive(Parser)]
pub struct ChatCommand {
    #[clap(help = "Message to send to the coach")]
    pub message: String,

    #[clap(long, help = "Ask for a speech-friendly answer")]
    pub voice: bool,

    #[clap(
        long,
        short = 'C',
        help = "Conversation ID; the server keeps history per conversation"
    )]
    pub conversation: Option<String>,

    #[clap(flatten)]
    pub context: ContextArgs,
}

impl ChatCommand {
    pub async fn execute(&self, client: &CoachClient, format: OutputFormat) -> CliResult<()> {
        let response = client
            .chat(
                &self.message,
                &self.context.to_context(),
                self.voice,
                self.conversation.as_deref(),
            )
            .await?;

        match format {
            OutputFormat::Json => print_json(&serde_json::json!({
                "conversation_id": self.conversation,
                "response": response,
            }))?,
            OutputFormat::Table => println!("{response}"),
        }

        Ok(())
    }
}
