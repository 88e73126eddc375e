use std::path::PathBuf;

use blockplan_core::{Config, SlotPlanner};
use clap::Args;

use super::{read_json, PlanRequest};

#[derive(Args)]
pub struct PlanArgs {
    /// JSON file with `free_slots` and `goals` (stdin if omitted)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Tie-break order for goals sharing a rank (comma separated ids)
    #[arg(long, value_delimiter = ',')]
    pub prefer: Vec<String>,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request: PlanRequest = read_json(args.input.as_deref())?;
    tracing::debug!(
        slots = request.free_slots.len(),
        goals = request.goals.len(),
        "plan request loaded"
    );

    let mut planner_config = Config::load_or_default().planner;
    if !args.prefer.is_empty() {
        planner_config.preferred_order = args.prefer;
    }

    let outcome = SlotPlanner::with_config(planner_config).plan(&request.free_slots, &request.goals)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
