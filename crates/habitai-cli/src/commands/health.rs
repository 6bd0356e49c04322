use clap::Parser;

use crate::client::CoachClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, key_value_table, print_json};

#[derive(Parser)]
pub struct HealthCommand {}

impl HealthCommand {
    pub async fn execute(&self, client: &CoachClient, format: OutputFormat) -> CliResult<()> {
        let health = client.health().await?;

        match format {
            OutputFormat::Json => print_json(&health)?,
            OutputFormat::Table => {
                println!("HabitAI server at {}\n", client.base_url());

                let field = |name: &str| match &health[name] {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => "-".to_string(),
                    other => other.to_string(),
                };
                let table = key_value_table(
                    ["Field", "Value"],
                    [
                        ("Status", field("status")),
                        ("Version", field("version")),
                        ("Upstream configured", field("upstreamConfigured")),
                    ],
                );
                println!("{table}");

                if let Some(endpoints) = health["endpoints"].as_object() {
                    println!("\nEndpoints:");
                    for (name, route) in endpoints {
                        println!("  {name:<18} {}", route.as_str().unwrap_or_default());
                    }
                }
            }
        }

        Ok(())
    }
}
