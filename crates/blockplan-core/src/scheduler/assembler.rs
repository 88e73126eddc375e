//! Turning per-slot plans into one schedule.

use super::block::{Block, Schedule, SlotPlan};

/// Concatenates slot plans into a [`Schedule`].
pub struct ScheduleAssembler;

impl ScheduleAssembler {
    /// Flatten every slot's blocks and order them by start time.
    ///
    /// Slot plans arrive chronologically already; the sort keeps the result
    /// correct for any caller-built input.
    pub fn assemble(plans: Vec<SlotPlan>) -> Schedule {
        let mut blocks: Vec<Block> = plans.into_iter().flat_map(|plan| plan.blocks).collect();
        blocks.sort_by(|a, b| (a.start, a.slot_index, a.end).cmp(&(b.start, b.slot_index, b.end)));
        Schedule::from_sorted(blocks)
    }
}
