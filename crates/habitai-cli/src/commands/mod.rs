pub mod analyze;
pub mod chat;
pub mod health;
pub mod history;
pub mod plan;

pub use analyze::AnalyzeCommand;
pub use chat::ChatCommand;
pub use health::HealthCommand;
pub use history::{HistoryCommand, ResetCommand};
pub use plan::PlanCommand;

use clap::Args;
use habitai_server::coach::ChatContext;

/// Habit progress sent along with chat and analysis requests
#[derive(Args, Debug)]
pub struct ContextArgs {
    #[clap(long, help = "Name of the habit being built")]
    pub habit: Option<String>,

    #[clap(long, default_value = "1", help = "Current day of the 66-day journey")]
    pub day: u32,

    #[clap(long, default_value = "0", help = "Current streak in days")]
    pub streak: u32,

    #[clap(long, default_value = "0", help = "Total days completed")]
    pub total: u32,

    #[clap(long, default_value = "0", help = "Days missed so far")]
    pub missed: u32,
}

impl ContextArgs {
    pub fn to_context(&self) -> ChatContext {
        ChatContext {
            habit_name: self.habit.clone().unwrap_or_default(),
            current_day: self.day,
            streak: self.streak,
            total_completed: self.total,
            missed_days: self.missed,
        }
    }
}
