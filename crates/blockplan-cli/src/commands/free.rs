use std::collections::BTreeMap;
use std::path::PathBuf;

use blockplan_core::timeline::{free_slots, merge_busy};
use blockplan_core::{BusyInterval, WorkWindow};
use chrono::{DateTime, Utc};
use clap::Args;

use super::read_json;

#[derive(Args)]
pub struct FreeArgs {
    /// Start of the working window (RFC 3339)
    #[arg(long)]
    pub start: DateTime<Utc>,
    /// End of the working window (RFC 3339)
    #[arg(long)]
    pub end: DateTime<Utc>,
    /// JSON map of calendar id to busy intervals (stdin if omitted)
    #[arg(short, long)]
    pub busy: Option<PathBuf>,
}

pub fn run(args: FreeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let window = WorkWindow::new(args.start, args.end)?;
    let calendars: BTreeMap<String, Vec<BusyInterval>> = read_json(args.busy.as_deref())?;

    let slots = free_slots(&window, &merge_busy(&calendars));
    println!("{}", serde_json::to_string_pretty(&slots)?);
    Ok(())
}
