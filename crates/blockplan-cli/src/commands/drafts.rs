use std::path::PathBuf;

use blockplan_core::{draft_events, Config, ConfirmationGate, CoreError, GoalQueue, SlotPlanner};
use clap::Args;
use serde_json::json;

use super::{read_json, PlanRequest};

#[derive(Args)]
pub struct DraftsArgs {
    /// JSON file with `free_slots` and `goals` (stdin if omitted)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Only draft blocks of these goal ids
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,
    /// Release the drafts for creation
    #[arg(long)]
    pub confirm: bool,
}

pub fn run(args: DraftsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request: PlanRequest = read_json(args.input.as_deref())?;
    let config = Config::load_or_default();

    let outcome = SlotPlanner::with_config(config.planner.clone()).plan(&request.free_slots, &request.goals)?;
    let goals = GoalQueue::resolve(&request.goals, &config.planner)?;
    let drafts = ConfirmationGate::select(
        draft_events(&outcome.schedule, &goals, &config.drafts),
        &args.select,
    );

    match ConfirmationGate::release(drafts.clone(), args.confirm) {
        Ok(released) => {
            let output = json!({ "status": "confirmed", "drafts": released });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Err(CoreError::ConfirmationRequired { count }) => {
            let output = json!({ "status": "pending", "drafts": drafts });
            println!("{}", serde_json::to_string_pretty(&output)?);
            eprintln!("{count} draft(s) not confirmed; pass --confirm to release them");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
