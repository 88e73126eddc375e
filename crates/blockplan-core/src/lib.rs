//! # blockplan Core Library
//!
//! Deterministic, slot-aware planning of goal blocks into free calendar
//! time. The CLI is a thin layer over this library; calendar access and
//! event writes live outside it.
//!
//! ## Architecture
//!
//! - **Timeline**: free slot normalization and busy-to-free inversion
//! - **Scheduler**: goal ordering, block packing, schedule assembly and
//!   invariant validation
//! - **Drafts**: event payloads held behind an explicit confirmation
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SlotPlanner`]: runs the whole pipeline for one request
//! - [`BlockPacker`]: the packing algorithm
//! - [`Validator`]: schedule invariant checks
//! - [`Fixture`]: versioned demo inputs

pub mod drafts;
pub mod error;
pub mod scheduler;
pub mod storage;
pub mod timeline;

pub use drafts::{draft_events, ConfirmationGate, EventDraft};
pub use error::{ConfigError, CoreError, Result, ValidationError};
pub use scheduler::{
    Block, BlockPacker, Fixture, Goal, GoalQueue, GoalSpec, PackPolicy, PlanOutcome, Schedule,
    ScheduleAssembler, SlotPlanner, TieBreak, UnallocatedGoal, Validator, Violation,
    FIXTURE_A1_VERSION, MAX_GOAL_MINUTES,
};
pub use storage::{Config, DraftsConfig, PlannerConfig};
pub use timeline::{BusyInterval, FreeSlot, SlotIndex, WorkWindow};
