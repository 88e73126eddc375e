//! Versioned demo scenarios.
//!
//! A fixture is plain input data. Running one goes through
//! [`SlotPlanner::plan`] exactly like a live request, so the demo and the
//! real planner can never disagree.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{GoalSpec, PlanOutcome, SlotPlanner};
use crate::error::Result;
use crate::storage::PlannerConfig;
use crate::timeline::FreeSlot;

/// Version tag of the A1 scenario. Bump when its inputs change.
pub const FIXTURE_A1_VERSION: &str = "a1/v1";

/// 2025-12-29T09:00:00Z, in seconds since the Unix epoch
const A1_SLOT_START: i64 = 1_766_998_800;

/// A named, versioned planning input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fixture {
    pub name: &'static str,
    pub version: &'static str,
    pub free_slots: Vec<FreeSlot>,
    pub goals: Vec<GoalSpec>,
    pub config: PlannerConfig,
}

impl Fixture {
    /// One three-hour slot shared by deep work and admin.
    pub fn a1() -> Self {
        let start = DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(A1_SLOT_START);
        Self {
            name: "a1",
            version: FIXTURE_A1_VERSION,
            free_slots: vec![FreeSlot {
                start,
                end: start + Duration::minutes(180),
            }],
            goals: vec![
                GoalSpec::new("deep-work", 1, 120)
                    .with_name("Deep Work")
                    .with_min_block(30)
                    .with_buffer(10),
                GoalSpec::new("admin", 2, 60)
                    .with_name("Admin")
                    .with_min_block(15)
                    .with_buffer(10),
            ],
            // Pinned rather than PlannerConfig::default() so the scenario
            // only changes with its version
            config: PlannerConfig {
                default_min_block_minutes: 30,
                default_buffer_minutes: 10,
                reserve_follower_buffer: true,
                validate_output: true,
                preferred_order: Vec::new(),
            },
        }
    }

    /// Look up a fixture by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a1" => Some(Self::a1()),
            _ => None,
        }
    }

    /// Names accepted by [`Fixture::by_name`].
    pub fn names() -> &'static [&'static str] {
        &["a1"]
    }

    /// Plan the fixture through the regular planner.
    pub fn run(&self) -> Result<PlanOutcome> {
        SlotPlanner::with_config(self.config.clone()).plan(&self.free_slots, &self.goals)
    }
}
