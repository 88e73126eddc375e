//! Schedule invariant checks.
//!
//! A violation here means the packer is wrong, never that the caller sent
//! bad input: inputs are rejected before packing starts.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use super::block::{Block, Schedule};
use super::goal::Goal;
use crate::timeline::FreeSlot;

/// One broken invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("block references unknown goal '{goal_id}'")]
    UnknownGoal { goal_id: String },

    #[error("block for '{goal_id}' references unknown slot {slot_index}")]
    UnknownSlot { goal_id: String, slot_index: usize },

    #[error("block for '{goal_id}' at {start} has no duration")]
    EmptyBlock { goal_id: String, start: DateTime<Utc> },

    #[error("blocks for '{first}' and '{second}' overlap at {at}")]
    Overlap {
        first: String,
        second: String,
        at: DateTime<Utc>,
    },

    #[error("block for '{goal_id}' at {start} leaves slot {slot_index}")]
    OutsideSlot {
        goal_id: String,
        slot_index: usize,
        start: DateTime<Utc>,
    },

    #[error("block for '{goal_id}' lasts {minutes}m, below its {min_minutes}m minimum")]
    BelowMinimum {
        goal_id: String,
        minutes: i64,
        min_minutes: i64,
    },

    #[error("goal '{goal_id}' got {allocated_minutes}m, above its {target_minutes}m target")]
    OverAllocated {
        goal_id: String,
        allocated_minutes: i64,
        target_minutes: i64,
    },

    #[error("only {gap_minutes}m between '{goal_id}' and '{next_goal_id}', buffer is {buffer_minutes}m")]
    BufferTooShort {
        goal_id: String,
        next_goal_id: String,
        gap_minutes: i64,
        buffer_minutes: i64,
    },
}

/// Checks schedules against the packing invariants.
pub struct Validator;

impl Validator {
    /// Check `schedule` against the normalized `slots` and resolved `goals`
    /// it was planned from. Returns every violation found.
    pub fn validate(schedule: &Schedule, slots: &[FreeSlot], goals: &[Goal]) -> Result<(), Vec<Violation>> {
        let goals_by_id: HashMap<&str, &Goal> = goals.iter().map(|g| (g.id.as_str(), g)).collect();
        let mut violations = Vec::new();

        let mut sorted: Vec<&Block> = schedule.iter().collect();
        sorted.sort_by_key(|b| (b.start, b.end));

        check_blocks(&sorted, slots, &goals_by_id, &mut violations);
        check_overlaps(&sorted, &mut violations);
        check_totals(schedule, goals, &mut violations);
        check_buffers(&sorted, &goals_by_id, &mut violations);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn check_blocks(
    blocks: &[&Block],
    slots: &[FreeSlot],
    goals: &HashMap<&str, &Goal>,
    violations: &mut Vec<Violation>,
) {
    for block in blocks {
        if block.end <= block.start {
            violations.push(Violation::EmptyBlock {
                goal_id: block.goal_id.clone(),
                start: block.start,
            });
        }

        match slots.get(block.slot_index) {
            None => violations.push(Violation::UnknownSlot {
                goal_id: block.goal_id.clone(),
                slot_index: block.slot_index,
            }),
            Some(slot) if !slot.contains(block.start, block.end) => {
                violations.push(Violation::OutsideSlot {
                    goal_id: block.goal_id.clone(),
                    slot_index: block.slot_index,
                    start: block.start,
                })
            }
            Some(_) => {}
        }

        match goals.get(block.goal_id.as_str()) {
            None => violations.push(Violation::UnknownGoal {
                goal_id: block.goal_id.clone(),
            }),
            Some(goal) if block.duration() < goal.min_block => {
                violations.push(Violation::BelowMinimum {
                    goal_id: block.goal_id.clone(),
                    minutes: block.duration_minutes(),
                    min_minutes: goal.min_block.num_minutes(),
                })
            }
            Some(_) => {}
        }
    }
}

fn check_overlaps(blocks: &[&Block], violations: &mut Vec<Violation>) {
    for (i, first) in blocks.iter().enumerate() {
        for second in &blocks[i + 1..] {
            if second.start >= first.end {
                break;
            }
            if first.overlaps(second) {
                violations.push(Violation::Overlap {
                    first: first.goal_id.clone(),
                    second: second.goal_id.clone(),
                    at: second.start,
                });
            }
        }
    }
}

fn check_totals(schedule: &Schedule, goals: &[Goal], violations: &mut Vec<Violation>) {
    for goal in goals {
        let allocated = schedule.allocated_for(&goal.id);
        if allocated > goal.target {
            violations.push(Violation::OverAllocated {
                goal_id: goal.id.clone(),
                allocated_minutes: allocated.num_minutes(),
                target_minutes: goal.target.num_minutes(),
            });
        }
    }
}

fn check_buffers(blocks: &[&Block], goals: &HashMap<&str, &Goal>, violations: &mut Vec<Violation>) {
    let mut by_slot: BTreeMap<usize, Vec<&Block>> = BTreeMap::new();
    for &block in blocks {
        by_slot.entry(block.slot_index).or_default().push(block);
    }

    for slot_blocks in by_slot.values() {
        for pair in slot_blocks.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let Some(goal) = goals.get(prev.goal_id.as_str()) else {
                continue;
            };
            let gap: Duration = next.start - prev.end;
            if gap < goal.buffer {
                violations.push(Violation::BufferTooShort {
                    goal_id: prev.goal_id.clone(),
                    next_goal_id: next.goal_id.clone(),
                    gap_minutes: gap.num_minutes(),
                    buffer_minutes: goal.buffer.num_minutes(),
                });
            }
        }
    }
}
