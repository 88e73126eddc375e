//! Slot-aware planner for goal blocks.
//!
//! This module turns free slots and prioritized goals into a schedule:
//! - Resolves goal overrides against configuration and orders goals
//! - Normalizes free slots into a sorted, disjoint sequence
//! - Packs blocks per slot with minimum sizes, buffers and reservation
//! - Validates the result before handing it back
//!
//! Planning is a pure function of its inputs. Nothing survives the call.

mod assembler;
mod block;
pub mod fixture;
mod goal;
mod packer;
mod validator;

pub use assembler::ScheduleAssembler;
pub use block::{Block, Schedule, SlotPlan};
pub use fixture::{Fixture, FIXTURE_A1_VERSION};
pub use goal::{Goal, GoalQueue, GoalSpec, TieBreak, MAX_GOAL_MINUTES};
pub use packer::{BlockPacker, PackPolicy};
pub use validator::{Validator, Violation};

use std::collections::HashMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::storage::PlannerConfig;
use crate::timeline::{self, BusyInterval, FreeSlot, SlotIndex};

/// A goal that received less than its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnallocatedGoal {
    pub goal_id: String,
    pub target_minutes: i64,
    pub allocated_minutes: i64,
    pub missing_minutes: i64,
}

/// Result of one planning call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanOutcome {
    /// The normalized slots that block `slot_index` values point into
    pub free_slots: Vec<FreeSlot>,
    pub schedule: Schedule,
    /// Goals short of their target, in service order
    pub unallocated: Vec<UnallocatedGoal>,
}

impl PlanOutcome {
    /// The part of the request this plan could not satisfy.
    ///
    /// Goals come back with their target reduced to the unmet need; goals
    /// whose need is below their minimum block are dropped, since no valid
    /// block could serve them. Slots come back minus the time used by the
    /// schedule, each block's buffer included, so re-planned blocks keep
    /// their distance from the blocks already placed.
    pub fn remainder(
        &self,
        specs: &[GoalSpec],
        config: &PlannerConfig,
    ) -> Result<(Vec<GoalSpec>, Vec<FreeSlot>), ValidationError> {
        let mut goals = Vec::new();
        let mut buffers: HashMap<String, Duration> = HashMap::new();
        for spec in specs {
            let goal = spec.resolve(config)?;
            buffers.insert(goal.id.clone(), goal.buffer);
            let missing = goal.target - self.schedule.allocated_for(&goal.id);
            if missing < goal.min_block || missing <= Duration::zero() {
                continue;
            }
            goals.push(GoalSpec {
                target_minutes: missing.num_minutes(),
                min_block_minutes: Some(goal.min_block.num_minutes()),
                buffer_minutes: Some(goal.buffer.num_minutes()),
                ..spec.clone()
            });
        }

        let used: Vec<BusyInterval> = self
            .schedule
            .iter()
            .map(|block| {
                let buffer = buffers.get(&block.goal_id).copied().unwrap_or_else(Duration::zero);
                let slot_end = self.free_slots.get(block.slot_index).map_or(block.end, |slot| slot.end);
                let end = block
                    .end
                    .checked_add_signed(buffer)
                    .map_or(slot_end, |end| end.min(slot_end))
                    .max(block.end);
                BusyInterval::new(block.start, end)
            })
            .collect();
        Ok((goals, timeline::subtract(&self.free_slots, &used)))
    }
}

/// Runs the full planning pipeline.
#[derive(Debug, Clone, Default)]
pub struct SlotPlanner {
    config: PlannerConfig,
}

impl SlotPlanner {
    /// Create a planner with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan goal blocks into free slots.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for malformed slots, goals or
    /// configuration, before anything is packed. Returns
    /// [`CoreError::InvariantViolation`] if output validation is enabled
    /// and the packed schedule is inconsistent.
    pub fn plan(&self, slots: &[FreeSlot], specs: &[GoalSpec]) -> Result<PlanOutcome> {
        let span = tracing::info_span!("plan", slots = slots.len(), goals = specs.len());
        let _enter = span.enter();

        self.config.validate()?;
        if let Some(bad) = slots.iter().find(|s| s.end <= s.start) {
            return Err(ValidationError::InvalidTimeRange {
                start: bad.start,
                end: bad.end,
            }
            .into());
        }

        let goals = GoalQueue::resolve(specs, &self.config)?;
        let queue = GoalQueue::with_tie_break(TieBreak::from(self.config.preferred_order.as_slice()));
        let ordered = queue.order(&goals)?;

        let free_slots = SlotIndex::normalize(slots);
        let packer = BlockPacker::with_policy(PackPolicy {
            reserve_follower_buffer: self.config.reserve_follower_buffer,
        });
        let schedule = ScheduleAssembler::assemble(packer.pack(&ordered, &free_slots));

        if self.config.validate_output {
            if let Err(violations) = Validator::validate(&schedule, &free_slots, &ordered) {
                for violation in &violations {
                    tracing::error!(%violation, "schedule invariant violated");
                }
                return Err(CoreError::InvariantViolation(violations));
            }
        }

        let unallocated: Vec<UnallocatedGoal> = ordered
            .iter()
            .filter_map(|goal| {
                let allocated = schedule.allocated_for(&goal.id);
                (allocated < goal.target).then(|| UnallocatedGoal {
                    goal_id: goal.id.clone(),
                    target_minutes: goal.target.num_minutes(),
                    allocated_minutes: allocated.num_minutes(),
                    missing_minutes: (goal.target - allocated).num_minutes(),
                })
            })
            .collect();

        for goal in &unallocated {
            tracing::warn!(
                goal = %goal.goal_id,
                missing_minutes = goal.missing_minutes,
                "goal not fully scheduled"
            );
        }
        tracing::info!(
            blocks = schedule.len(),
            scheduled_minutes = schedule.total().num_minutes(),
            unallocated = unallocated.len(),
            "plan complete"
        );

        Ok(PlanOutcome {
            free_slots,
            schedule,
            unallocated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 20, hour, minute, 0).unwrap()
    }

    fn slot(from: (u32, u32), to: (u32, u32)) -> FreeSlot {
        FreeSlot {
            start: at(from.0, from.1),
            end: at(to.0, to.1),
        }
    }

    #[test]
    fn plan_rejects_malformed_slot_before_packing() {
        let result = SlotPlanner::new().plan(&[slot((10, 0), (9, 0))], &[GoalSpec::new("a", 1, 30)]);
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::InvalidTimeRange { .. }))
        ));
    }

    #[test]
    fn plan_rejects_malformed_goal() {
        let result = SlotPlanner::new().plan(
            &[slot((9, 0), (10, 0))],
            &[GoalSpec::new("a", 1, 30).with_min_block(45)],
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn plan_rejects_out_of_range_durations() {
        let slots = [slot((9, 0), (12, 0))];

        let huge_target = SlotPlanner::new().plan(&slots, &[GoalSpec::new("a", 1, i64::MAX / 2)]);
        assert!(matches!(
            huge_target,
            Err(CoreError::Validation(ValidationError::InvalidGoal { .. }))
        ));

        let huge_buffer = SlotPlanner::new().plan(
            &slots,
            &[
                GoalSpec::new("a", 1, 30).with_min_block(30).with_buffer(10_000_000_000_000),
                GoalSpec::new("b", 2, 30).with_min_block(30).with_buffer(0),
            ],
        );
        assert!(matches!(
            huge_buffer,
            Err(CoreError::Validation(ValidationError::InvalidGoal { .. }))
        ));
    }

    #[test]
    fn plan_rejects_config_outside_guardrails() {
        let config = PlannerConfig {
            default_buffer_minutes: 120,
            ..PlannerConfig::default()
        };
        let result = SlotPlanner::with_config(config).plan(&[slot((9, 0), (10, 0))], &[]);
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn plan_reports_unallocated_goals() {
        let outcome = SlotPlanner::new()
            .plan(
                &[slot((9, 0), (10, 0))],
                &[
                    GoalSpec::new("deep", 1, 60).with_min_block(60),
                    GoalSpec::new("admin", 2, 30),
                ],
            )
            .unwrap();

        assert_eq!(outcome.schedule.len(), 1);
        assert_eq!(
            outcome.unallocated,
            vec![UnallocatedGoal {
                goal_id: "admin".into(),
                target_minutes: 30,
                allocated_minutes: 0,
                missing_minutes: 30,
            }]
        );
    }

    #[test]
    fn plan_with_no_slots_leaves_every_goal_unallocated() {
        let outcome = SlotPlanner::new()
            .plan(&[], &[GoalSpec::new("a", 1, 30), GoalSpec::new("b", 2, 30)])
            .unwrap();
        assert!(outcome.schedule.is_empty());
        assert_eq!(outcome.unallocated.len(), 2);
    }

    #[test]
    fn plan_normalizes_slots_before_packing() {
        let outcome = SlotPlanner::new()
            .plan(
                &[slot((9, 30), (10, 0)), slot((9, 0), (9, 30))],
                &[GoalSpec::new("a", 1, 60).with_min_block(60)],
            )
            .unwrap();
        assert_eq!(outcome.free_slots, vec![slot((9, 0), (10, 0))]);
        assert_eq!(outcome.schedule.blocks()[0].duration_minutes(), 60);
    }

    #[test]
    fn preferred_order_from_config_breaks_rank_ties() {
        let config = PlannerConfig {
            preferred_order: vec!["admin".into()],
            ..PlannerConfig::default()
        };
        let outcome = SlotPlanner::with_config(config)
            .plan(
                &[slot((9, 0), (11, 0))],
                &[GoalSpec::new("deep", 1, 60), GoalSpec::new("admin", 1, 30)],
            )
            .unwrap();
        assert_eq!(outcome.schedule.blocks()[0].goal_id, "admin");
    }

    #[test]
    fn remainder_drops_satisfied_and_unservable_goals() {
        let specs = vec![
            GoalSpec::new("deep", 1, 90).with_min_block(30).with_buffer(0),
            GoalSpec::new("admin", 2, 30).with_min_block(30).with_buffer(0),
        ];
        let outcome = SlotPlanner::new().plan(&[slot((9, 0), (10, 30))], &specs).unwrap();

        // deep is shrunk to 60 to keep 30 for admin
        let (goals, slots) = outcome.remainder(&specs, &PlannerConfig::default()).unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].id, "deep");
        assert_eq!(goals[0].target_minutes, 30);
        assert!(slots.is_empty());
    }

    #[test]
    fn remainder_keeps_the_buffer_after_placed_blocks() {
        let specs = vec![
            GoalSpec::new("deep", 1, 60).with_min_block(60).with_buffer(10),
            GoalSpec::new("admin", 2, 30).with_min_block(30).with_buffer(10),
        ];
        let outcome = SlotPlanner::new()
            .plan(&[slot((9, 0), (10, 30)), slot((13, 0), (13, 5))], &specs)
            .unwrap();
        assert_eq!(outcome.schedule.len(), 1);

        let (goals, slots) = outcome.remainder(&specs, &PlannerConfig::default()).unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(slots, vec![slot((10, 10), (10, 30)), slot((13, 0), (13, 5))]);
    }

    #[test]
    fn remainder_clips_the_buffer_to_the_slot() {
        let specs = vec![GoalSpec::new("deep", 1, 60).with_min_block(60).with_buffer(30)];
        let outcome = SlotPlanner::new()
            .plan(&[slot((9, 0), (10, 10)), slot((10, 20), (11, 0))], &specs)
            .unwrap();

        let (goals, slots) = outcome.remainder(&specs, &PlannerConfig::default()).unwrap();
        assert!(goals.is_empty());
        assert_eq!(slots, vec![slot((10, 20), (11, 0))]);
    }
}
