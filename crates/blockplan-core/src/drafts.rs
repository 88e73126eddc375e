//! Calendar event drafts built from a schedule.
//!
//! Drafts are plain values. Writing them to a calendar is the caller's
//! business and only happens after [`ConfirmationGate::release`] has been
//! given an explicit confirmation.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::scheduler::{Goal, Schedule};
use crate::storage::DraftsConfig;

/// An event payload that has not been created anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub goal_id: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone: String,
    pub description: String,
}

/// Build one draft per block, in schedule order. The summary is the goal's
/// display name, or its id for blocks of unknown goals.
pub fn draft_events(schedule: &Schedule, goals: &[Goal], config: &DraftsConfig) -> Vec<EventDraft> {
    let names: HashMap<&str, &str> = goals.iter().map(|g| (g.id.as_str(), g.name.as_str())).collect();

    schedule
        .iter()
        .map(|block| EventDraft {
            goal_id: block.goal_id.clone(),
            summary: names
                .get(block.goal_id.as_str())
                .copied()
                .unwrap_or(block.goal_id.as_str())
                .to_string(),
            start: block.start,
            end: block.end,
            time_zone: config.time_zone.clone(),
            description: config.description.clone(),
        })
        .collect()
}

/// Holds drafts back until the caller affirmatively confirms them.
pub struct ConfirmationGate;

impl ConfirmationGate {
    /// Keep only drafts for the selected goals. An empty selection keeps everything.
    pub fn select(drafts: Vec<EventDraft>, goal_ids: &[String]) -> Vec<EventDraft> {
        if goal_ids.is_empty() {
            return drafts;
        }
        let wanted: HashSet<&str> = goal_ids.iter().map(String::as_str).collect();
        drafts
            .into_iter()
            .filter(|d| wanted.contains(d.goal_id.as_str()))
            .collect()
    }

    /// Release drafts for writing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfirmationRequired`] unless `confirm` is true.
    pub fn release(drafts: Vec<EventDraft>, confirm: bool) -> Result<Vec<EventDraft>> {
        if !confirm {
            tracing::info!(count = drafts.len(), "drafts held back, confirmation missing");
            return Err(CoreError::ConfirmationRequired { count: drafts.len() });
        }
        Ok(drafts)
    }
}
