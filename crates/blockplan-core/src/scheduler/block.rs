//! Blocks and the schedules built from them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::timeline::{BusyInterval, FreeSlot};

/// A concrete allocation of time to one goal inside one free slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub goal_id: String,
    /// Index into the normalized free slots of the planning call
    pub slot_index: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Block {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Get total duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Check if this block intersects another
    pub fn overlaps(&self, other: &Block) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl From<&Block> for BusyInterval {
    fn from(block: &Block) -> Self {
        BusyInterval::new(block.start, block.end)
    }
}

/// Blocks placed into one free slot, in placement order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPlan {
    pub slot_index: usize,
    pub slot: FreeSlot,
    pub blocks: Vec<Block>,
}

impl SlotPlan {
    /// Time in the slot not covered by any block (buffers included).
    pub fn idle(&self) -> Duration {
        self.slot.duration() - self.blocks.iter().map(Block::duration).fold(Duration::zero(), |a, b| a + b)
    }
}

/// An ordered sequence of blocks, sorted by start time.
///
/// Only [`ScheduleAssembler`](super::ScheduleAssembler) builds one, so the
/// type serializes but never deserializes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    blocks: Vec<Block>,
}

impl Schedule {
    pub(crate) fn from_sorted(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total time given to a goal across all slots.
    pub fn allocated_for(&self, goal_id: &str) -> Duration {
        self.blocks
            .iter()
            .filter(|b| b.goal_id == goal_id)
            .map(Block::duration)
            .fold(Duration::zero(), |acc, d| acc + d)
    }

    /// Sum of all block durations.
    pub fn total(&self) -> Duration {
        self.blocks.iter().map(Block::duration).fold(Duration::zero(), |acc, d| acc + d)
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
