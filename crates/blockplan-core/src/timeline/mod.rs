//! Free time representation.
//!
//! This module provides:
//! - Free slot normalization (sorted, disjoint, merged)
//! - Busy interval merging and inversion into free slots

pub mod availability;
mod slot;

pub use availability::{free_slots, merge_busy, subtract, BusyInterval, WorkWindow};
pub use slot::{FreeSlot, SlotIndex};
