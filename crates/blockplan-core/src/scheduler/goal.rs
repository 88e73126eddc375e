//! Goals and their deterministic service order.

use std::collections::HashSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::storage::PlannerConfig;

/// Upper bound for a goal's target, minimum block and buffer (one week).
pub const MAX_GOAL_MINUTES: i64 = 7 * 24 * 60;

fn goal_minutes(goal_id: &str, field: &str, minutes: i64) -> Result<Duration, ValidationError> {
    if minutes > MAX_GOAL_MINUTES {
        return Err(ValidationError::goal(
            goal_id,
            format!("{field} ({minutes}m) exceeds {MAX_GOAL_MINUTES}m"),
        ));
    }
    Duration::try_minutes(minutes)
        .ok_or_else(|| ValidationError::goal(goal_id, format!("{field} ({minutes}m) is out of range")))
}

/// A goal as supplied by the caller.
///
/// Durations are whole minutes. Missing overrides are filled from
/// [`PlannerConfig`] when the goal is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSpec {
    pub id: String,
    /// Display name; falls back to the id
    #[serde(default)]
    pub name: Option<String>,
    /// Lower rank is served first
    pub priority_rank: i32,
    pub target_minutes: i64,
    #[serde(default)]
    pub min_block_minutes: Option<i64>,
    #[serde(default)]
    pub buffer_minutes: Option<i64>,
}

impl GoalSpec {
    pub fn new(id: impl Into<String>, priority_rank: i32, target_minutes: i64) -> Self {
        Self {
            id: id.into(),
            name: None,
            priority_rank,
            target_minutes,
            min_block_minutes: None,
            buffer_minutes: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_min_block(mut self, minutes: i64) -> Self {
        self.min_block_minutes = Some(minutes);
        self
    }

    pub fn with_buffer(mut self, minutes: i64) -> Self {
        self.buffer_minutes = Some(minutes);
        self
    }

    /// Merge with configuration defaults and check the duration rules.
    ///
    /// A defaulted minimum larger than the target is clamped to the target;
    /// an explicit one is rejected.
    pub fn resolve(&self, config: &PlannerConfig) -> Result<Goal, ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "goal.id".into(),
                message: "must not be empty".into(),
            });
        }
        if self.target_minutes <= 0 {
            return Err(ValidationError::goal(&self.id, "target duration must be positive"));
        }

        let min_block = match self.min_block_minutes {
            Some(m) => m,
            None => i64::from(config.default_min_block_minutes).min(self.target_minutes),
        };
        let buffer = self
            .buffer_minutes
            .unwrap_or_else(|| i64::from(config.default_buffer_minutes));

        let goal = Goal {
            id: self.id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.id.clone()),
            priority_rank: self.priority_rank,
            target: goal_minutes(&self.id, "target", self.target_minutes)?,
            min_block: goal_minutes(&self.id, "minimum block", min_block)?,
            buffer: goal_minutes(&self.id, "buffer", buffer)?,
        };
        goal.validate()?;
        Ok(goal)
    }
}

/// A goal with every duration resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub priority_rank: i32,
    pub target: Duration,
    pub min_block: Duration,
    /// Gap required before whatever block follows this goal's block in the same slot
    pub buffer: Duration,
}

impl Goal {
    /// Check `0 < min_block <= target <= MAX_GOAL_MINUTES` and a buffer
    /// in `0..=MAX_GOAL_MINUTES`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.target <= Duration::zero() {
            return Err(ValidationError::goal(&self.id, "target duration must be positive"));
        }
        if self.min_block <= Duration::zero() {
            return Err(ValidationError::goal(&self.id, "minimum block must be positive"));
        }
        if self.min_block > self.target {
            return Err(ValidationError::goal(
                &self.id,
                format!(
                    "minimum block ({}m) exceeds target ({}m)",
                    self.min_block.num_minutes(),
                    self.target.num_minutes()
                ),
            ));
        }
        if self.buffer < Duration::zero() {
            return Err(ValidationError::goal(&self.id, "buffer must not be negative"));
        }
        let max = Duration::minutes(MAX_GOAL_MINUTES);
        if self.target > max || self.buffer > max {
            return Err(ValidationError::goal(
                &self.id,
                format!("durations are limited to {MAX_GOAL_MINUTES}m"),
            ));
        }
        Ok(())
    }
}

/// How goals sharing a priority rank are ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// Keep caller order
    #[default]
    InputOrder,
    /// Listed ids first, in list order; the rest keep caller order
    Preferred(Vec<String>),
}

impl From<&[String]> for TieBreak {
    fn from(order: &[String]) -> Self {
        if order.is_empty() {
            TieBreak::InputOrder
        } else {
            TieBreak::Preferred(order.to_vec())
        }
    }
}

impl TieBreak {
    fn position(&self, goal_id: &str) -> usize {
        match self {
            TieBreak::InputOrder => 0,
            TieBreak::Preferred(ids) => ids.iter().position(|id| id == goal_id).unwrap_or(ids.len()),
        }
    }
}

/// Establishes the order in which goals are offered capacity.
#[derive(Debug, Clone, Default)]
pub struct GoalQueue {
    tie_break: TieBreak,
}

impl GoalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tie_break(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    /// Resolve caller specs against configuration defaults.
    pub fn resolve(specs: &[GoalSpec], config: &PlannerConfig) -> Result<Vec<Goal>, ValidationError> {
        specs.iter().map(|spec| spec.resolve(config)).collect()
    }

    /// Sort by priority rank, breaking ties with the configured policy.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed goal or on a duplicated id.
    pub fn order(&self, goals: &[Goal]) -> Result<Vec<Goal>, ValidationError> {
        let mut seen = HashSet::with_capacity(goals.len());
        for goal in goals {
            goal.validate()?;
            if !seen.insert(goal.id.as_str()) {
                return Err(ValidationError::DuplicateGoal(goal.id.clone()));
            }
        }

        let mut ordered = goals.to_vec();
        // sort_by_key is stable, so equal keys keep caller order
        ordered.sort_by_key(|g| (g.priority_rank, self.tie_break.position(&g.id)));
        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(spec: GoalSpec) -> Result<Goal, ValidationError> {
        spec.resolve(&PlannerConfig::default())
    }

    fn ids(goals: &[Goal]) -> Vec<&str> {
        goals.iter().map(|g| g.id.as_str()).collect()
    }

    #[test]
    fn resolve_applies_config_defaults() {
        let goal = resolve(GoalSpec::new("deep", 1, 120)).unwrap();
        assert_eq!(goal.min_block, Duration::minutes(30));
        assert_eq!(goal.buffer, Duration::minutes(10));
        assert_eq!(goal.name, "deep");
    }

    #[test]
    fn resolve_prefers_goal_overrides() {
        let goal = resolve(
            GoalSpec::new("deep", 1, 120)
                .with_name("Deep Work")
                .with_min_block(45)
                .with_buffer(0),
        )
        .unwrap();
        assert_eq!(goal.min_block, Duration::minutes(45));
        assert_eq!(goal.buffer, Duration::zero());
        assert_eq!(goal.name, "Deep Work");
    }

    #[test]
    fn resolve_clamps_defaulted_min_block_to_target() {
        let goal = resolve(GoalSpec::new("standup", 1, 15)).unwrap();
        assert_eq!(goal.min_block, Duration::minutes(15));
    }

    #[test]
    fn resolve_rejects_malformed_goals() {
        assert!(resolve(GoalSpec::new("a", 1, 0)).is_err());
        assert!(resolve(GoalSpec::new("a", 1, -30)).is_err());
        assert!(resolve(GoalSpec::new("a", 1, 60).with_min_block(0)).is_err());
        assert!(resolve(GoalSpec::new("a", 1, 60).with_min_block(90)).is_err());
        assert!(resolve(GoalSpec::new("a", 1, 60).with_buffer(-5)).is_err());
        assert!(resolve(GoalSpec::new(" ", 1, 60)).is_err());
    }

    #[test]
    fn resolve_rejects_durations_beyond_a_week() {
        assert!(resolve(GoalSpec::new("a", 1, MAX_GOAL_MINUTES)).is_ok());
        assert!(resolve(GoalSpec::new("a", 1, MAX_GOAL_MINUTES + 1)).is_err());
        assert!(resolve(GoalSpec::new("a", 1, i64::MAX / 2)).is_err());
        assert!(resolve(GoalSpec::new("a", 1, 30).with_buffer(10_000_000_000_000)).is_err());
        assert!(resolve(GoalSpec::new("a", 1, 30).with_min_block(i64::MIN)).is_err());
    }

    #[test]
    fn order_rejects_unbounded_buffer() {
        let goal = Goal {
            id: "x".into(),
            name: "x".into(),
            priority_rank: 1,
            target: Duration::minutes(30),
            min_block: Duration::minutes(30),
            buffer: Duration::minutes(MAX_GOAL_MINUTES + 1),
        };
        assert!(GoalQueue::new().order(&[goal]).is_err());
    }

    #[test]
    fn order_by_rank_then_input_position() {
        let goals = GoalQueue::resolve(
            &[
                GoalSpec::new("c", 2, 30),
                GoalSpec::new("a", 1, 30),
                GoalSpec::new("d", 2, 30),
                GoalSpec::new("b", 1, 30),
            ],
            &PlannerConfig::default(),
        )
        .unwrap();

        let ordered = GoalQueue::new().order(&goals).unwrap();
        assert_eq!(ids(&ordered), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn preferred_tie_break_only_reorders_within_rank() {
        let goals = GoalQueue::resolve(
            &[
                GoalSpec::new("deep", 1, 60),
                GoalSpec::new("admin", 1, 30),
                GoalSpec::new("lunch", 1, 30),
                GoalSpec::new("email", 0, 30),
            ],
            &PlannerConfig::default(),
        )
        .unwrap();

        let queue = GoalQueue::with_tie_break(TieBreak::Preferred(vec!["admin".into(), "deep".into()]));
        let ordered = queue.order(&goals).unwrap();
        assert_eq!(ids(&ordered), vec!["email", "admin", "deep", "lunch"]);
    }

    #[test]
    fn empty_preferred_order_means_input_order() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(TieBreak::from(empty.as_slice()), TieBreak::InputOrder);
    }

    #[test]
    fn order_rejects_duplicate_ids() {
        let goals = GoalQueue::resolve(
            &[GoalSpec::new("a", 1, 30), GoalSpec::new("a", 2, 30)],
            &PlannerConfig::default(),
        )
        .unwrap();
        assert_eq!(
            GoalQueue::new().order(&goals),
            Err(ValidationError::DuplicateGoal("a".into()))
        );
    }

    #[test]
    fn order_rejects_inconsistent_durations() {
        let goal = Goal {
            id: "x".into(),
            name: "x".into(),
            priority_rank: 1,
            target: Duration::minutes(20),
            min_block: Duration::minutes(30),
            buffer: Duration::zero(),
        };
        assert!(GoalQueue::new().order(&[goal]).is_err());
    }
}
