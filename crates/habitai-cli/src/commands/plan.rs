use clap::Parser;

use crate::client::CoachClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, key_value_table, print_json};

#[derive(Parser)]
pub struct PlanCommand {
    #[clap(help = "The habit you want to build, e.g. \"read every day\"")]
    pub description: String,
}

impl PlanCommand {
    pub async fn execute(&self, client: &CoachClient, format: OutputFormat) -> CliResult<()> {
        let plan = client.habit_plan(&self.description).await?;

        match format {
            OutputFormat::Json => print_json(&plan)?,
            OutputFormat::Table => {
                println!("Plan for \"{}\"\n", self.description);
                let table = key_value_table(
                    ["Step", "Plan"],
                    [
                        ("Tiny version", plan.tiny_version),
                        ("Trigger", plan.trigger),
                        ("Time", plan.time),
                        ("Motivation", plan.motivation),
                    ],
                );
                println!("{table}");
            }
        }

        Ok(())
    }
}
