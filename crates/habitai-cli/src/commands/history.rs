use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::client::CoachClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, print_json, truncate_string};

const MAX_CONTENT_WIDTH: usize = 80;

#[derive(Parser)]
pub struct HistoryCommand {
    #[clap(help = "Conversation ID")]
    pub conversation: String,

    #[clap(
        long,
        short,
        help = "Maximum number of recent messages (server default when omitted)"
    )]
    pub limit: Option<usize>,
}

impl HistoryCommand {
    pub async fn execute(&self, client: &CoachClient, format: OutputFormat) -> CliResult<()> {
        let messages = client.history(&self.conversation, self.limit).await?;

        match format {
            OutputFormat::Json => print_json(&messages)?,
            OutputFormat::Table => {
                if messages.is_empty() {
                    println!("No messages in conversation {}", self.conversation);
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["#", "Role", "Content"]);

                for (i, message) in messages.iter().enumerate() {
                    table.add_row([
                        (i + 1).to_string(),
                        message.role.as_str().to_string(),
                        truncate_string(&message.content, MAX_CONTENT_WIDTH),
                    ]);
                }

                println!("{table}");
                println!("\nShowing {} message(s)", messages.len());
            }
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct ResetCommand {
    #[clap(help = "Conversation ID to clear")]
    pub conversation: String,
}

impl ResetCommand {
    pub async fn execute(&self, client: &CoachClient, format: OutputFormat) -> CliResult<()> {
        client.reset(&self.conversation).await?;

        match format {
            OutputFormat::Json => print_json(&serde_json::json!({
                "conversation_id": self.conversation,
                "cleared": true,
            }))?,
            OutputFormat::Table => println!("Cleared conversation {}", self.conversation),
        }

        Ok(())
    }
}
