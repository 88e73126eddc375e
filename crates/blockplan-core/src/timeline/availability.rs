//! Derive free slots from busy intervals.
//!
//! The calendar collaborator hands over busy intervals per calendar,
//! already resolved to UTC. This module merges them and inverts them
//! inside a working-hours window. It performs no I/O.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::slot::FreeSlot;
use crate::error::ValidationError;

/// A period during which some calendar is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// The window of the day the user is willing to plan into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WorkWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }
}

/// Merge busy intervals from several calendars into one sorted,
/// non-overlapping list. Empty or inverted intervals are ignored.
pub fn merge_busy(calendars: &BTreeMap<String, Vec<BusyInterval>>) -> Vec<BusyInterval> {
    let all: Vec<BusyInterval> = calendars.values().flatten().copied().collect();
    merge_intervals(all)
}

fn merge_intervals(mut intervals: Vec<BusyInterval>) -> Vec<BusyInterval> {
    intervals.retain(|b| b.end > b.start);
    intervals.sort_by_key(|b| (b.start, b.end));

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Free intervals inside `window` once `busy` is taken out.
///
/// Busy intervals may be unsorted and overlapping; anything outside the
/// window is clipped away.
pub fn free_slots(window: &WorkWindow, busy: &[BusyInterval]) -> Vec<FreeSlot> {
    if window.end <= window.start {
        return Vec::new();
    }

    let clipped: Vec<BusyInterval> = busy
        .iter()
        .filter_map(|b| {
            let start = b.start.max(window.start);
            let end = b.end.min(window.end);
            (end > start).then_some(BusyInterval { start, end })
        })
        .collect();

    let mut free = Vec::new();
    let mut cursor = window.start;

    for b in merge_intervals(clipped) {
        if b.start > cursor {
            free.push(FreeSlot { start: cursor, end: b.start });
        }
        cursor = cursor.max(b.end);
        if cursor >= window.end {
            break;
        }
    }

    if cursor < window.end {
        free.push(FreeSlot { start: cursor, end: window.end });
    }

    free
}

/// Remove `used` time from `slots`, keeping every remaining fragment.
pub fn subtract(slots: &[FreeSlot], used: &[BusyInterval]) -> Vec<FreeSlot> {
    let used = merge_intervals(used.to_vec());
    slots
        .iter()
        .flat_map(|slot| {
            let window = WorkWindow { start: slot.start, end: slot.end };
            free_slots(&window, &used)
        })
        .collect()
}
