//! Free time windows and their normalization.
//!
//! Planning always runs over the minimal, sorted, disjoint representation
//! of available time so the result never depends on how the caller ordered
//! its input.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A contiguous interval with no pre-existing calendar commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FreeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FreeSlot {
    /// Create a slot, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Whether `[start, end)` lies entirely inside this slot.
    pub fn contains(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start <= start && end <= self.end
    }

    fn is_positive(&self) -> bool {
        self.end > self.start
    }
}

/// Normalizer for free slots.
pub struct SlotIndex;

impl SlotIndex {
    /// Drop empty slots, sort by start and merge any that overlap or touch.
    ///
    /// Never fails; an empty input yields an empty sequence.
    pub fn normalize(slots: &[FreeSlot]) -> Vec<FreeSlot> {
        let mut sorted: Vec<FreeSlot> = slots.iter().copied().filter(FreeSlot::is_positive).collect();
        sorted.sort_by_key(|s| (s.start, s.end));

        let mut merged: Vec<FreeSlot> = Vec::with_capacity(sorted.len());
        for slot in sorted {
            match merged.last_mut() {
                Some(last) if slot.start <= last.end => {
                    if slot.end > last.end {
                        last.end = slot.end;
                    }
                }
                _ => merged.push(slot),
            }
        }
        merged
    }
}
