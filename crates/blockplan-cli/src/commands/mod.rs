pub mod config;
pub mod drafts;
pub mod fixture;
pub mod free;
pub mod plan;

use std::io::Read;
use std::path::Path;

use blockplan_core::{FreeSlot, GoalSpec};
use serde::Deserialize;

/// Planning input accepted by `plan` and `drafts`.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub free_slots: Vec<FreeSlot>,
    pub goals: Vec<GoalSpec>,
}

/// Read a JSON document from `path`, or from stdin when absent or `-`.
pub fn read_json<T: serde::de::DeserializeOwned>(
    path: Option<&Path>,
) -> Result<T, Box<dyn std::error::Error>> {
    let content = match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&content)?)
}
