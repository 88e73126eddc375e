//! Packing goal blocks into free slots.
//!
//! Slots are visited chronologically. Inside a slot the goals are walked
//! once in priority order, each taking as much of its unmet need as fits,
//! except that a goal is shrunk when taking everything would leave no room
//! for the next goal still waiting for time. A block is also trimmed so
//! the goal's remaining need stays servable: it never leaves a need smaller
//! than the goal's minimum block when a split at the minimum is possible.
//! Buffers sit strictly between blocks: a goal's buffer is only paid when
//! another block follows it in the same slot.

use chrono::Duration;

use super::block::{Block, SlotPlan};
use super::goal::Goal;
use crate::timeline::FreeSlot;

/// Knobs for the packing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackPolicy {
    /// Reserve `min_block + buffer` of the next waiting goal, rather than
    /// only its `min_block`.
    pub reserve_follower_buffer: bool,
}

impl Default for PackPolicy {
    fn default() -> Self {
        Self {
            reserve_follower_buffer: true,
        }
    }
}

/// Per-call cumulative allocation per goal, indexed like the ordered goals.
struct AllocationLedger {
    allocated: Vec<Duration>,
}

impl AllocationLedger {
    fn new(goal_count: usize) -> Self {
        Self {
            allocated: vec![Duration::zero(); goal_count],
        }
    }

    fn need(&self, index: usize, goal: &Goal) -> Duration {
        goal.target - self.allocated[index]
    }

    /// A goal can take another block only while its need covers a minimum block.
    fn is_waiting(&self, index: usize, goal: &Goal) -> bool {
        let need = self.need(index, goal);
        need > Duration::zero() && need >= goal.min_block
    }

    fn record(&mut self, index: usize, amount: Duration) {
        self.allocated[index] = self.allocated[index] + amount;
    }
}

/// The packing algorithm.
#[derive(Debug, Clone, Default)]
pub struct BlockPacker {
    policy: PackPolicy,
}

impl BlockPacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: PackPolicy) -> Self {
        Self { policy }
    }

    /// Pack `goals` (already in service order) into `slots` (already
    /// normalized). Returns one plan per slot, in slot order.
    pub fn pack(&self, goals: &[Goal], slots: &[FreeSlot]) -> Vec<SlotPlan> {
        let mut ledger = AllocationLedger::new(goals.len());
        slots
            .iter()
            .enumerate()
            .map(|(slot_index, slot)| self.pack_slot(slot_index, slot, goals, &mut ledger))
            .collect()
    }

    fn pack_slot(
        &self,
        slot_index: usize,
        slot: &FreeSlot,
        goals: &[Goal],
        ledger: &mut AllocationLedger,
    ) -> SlotPlan {
        let next_waiting = next_waiting_goals(goals, ledger);

        let mut blocks = Vec::new();
        let mut cursor = slot.start;
        // Buffer owed by the last placed block, paid only if another block follows
        let mut owed_buffer = Duration::zero();

        for (index, goal) in goals.iter().enumerate() {
            if !ledger.is_waiting(index, goal) {
                continue;
            }

            let room = cursor
                .checked_add_signed(owed_buffer)
                .map(|start| (start, slot.end - start))
                .filter(|(_, room)| *room >= goal.min_block);
            let Some((start, room)) = room else {
                tracing::trace!(slot_index, goal = %goal.id, "goal does not fit");
                continue;
            };

            let need = ledger.need(index, goal);
            let mut amount = need.min(room);

            let leftover = need - amount;
            if leftover > Duration::zero() && leftover < goal.min_block && need - goal.min_block >= goal.min_block {
                amount = need - goal.min_block;
            }

            if let Some(next) = next_waiting[index].map(|i| &goals[i]) {
                let reserve = if self.policy.reserve_follower_buffer {
                    next.min_block + next.buffer
                } else {
                    next.min_block
                };
                if room - amount - goal.buffer < reserve {
                    let shrunk = room - goal.buffer - reserve;
                    if shrunk >= goal.min_block {
                        tracing::debug!(
                            slot_index,
                            goal = %goal.id,
                            reserved_for = %next.id,
                            from_minutes = amount.num_minutes(),
                            to_minutes = shrunk.num_minutes(),
                            "partial allocation"
                        );
                        amount = shrunk;
                    }
                }
            }

            let end = start + amount;
            tracing::debug!(slot_index, goal = %goal.id, %start, %end, "block placed");
            blocks.push(Block {
                goal_id: goal.id.clone(),
                slot_index,
                start,
                end,
            });
            ledger.record(index, amount);
            cursor = end;
            owed_buffer = goal.buffer;
        }

        SlotPlan {
            slot_index,
            slot: *slot,
            blocks,
        }
    }
}

/// For each goal, the index of the first later goal still waiting for time.
///
/// Computed once per slot: a goal's waiting state only changes on its own
/// turn, so goals after the current one are unchanged when it looks ahead.
fn next_waiting_goals(goals: &[Goal], ledger: &AllocationLedger) -> Vec<Option<usize>> {
    let mut next = vec![None; goals.len()];
    let mut following = None;
    for index in (0..goals.len()).rev() {
        next[index] = following;
        if ledger.is_waiting(index, &goals[index]) {
            following = Some(index);
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 29, hour, minute, 0).unwrap()
    }

    fn slot(from: (u32, u32), to: (u32, u32)) -> FreeSlot {
        FreeSlot::new(at(from.0, from.1), at(to.0, to.1)).unwrap()
    }

    fn goal(id: &str, target: i64, min_block: i64, buffer: i64) -> Goal {
        Goal {
            id: id.into(),
            name: id.into(),
            priority_rank: 0,
            target: Duration::minutes(target),
            min_block: Duration::minutes(min_block),
            buffer: Duration::minutes(buffer),
        }
    }

    fn spans(plans: &[SlotPlan]) -> Vec<(String, DateTime<Utc>, DateTime<Utc>)> {
        plans
            .iter()
            .flat_map(|p| p.blocks.iter())
            .map(|b| (b.goal_id.clone(), b.start, b.end))
            .collect()
    }

    #[test]
    fn partial_allocation_leaves_room_for_next_goal() {
        let packer = BlockPacker::with_policy(PackPolicy {
            reserve_follower_buffer: false,
        });
        let goals = vec![goal("deep", 60, 30, 10), goal("admin", 30, 30, 10)];

        let plans = packer.pack(&goals, &[slot((9, 0), (10, 20))]);

        assert_eq!(
            spans(&plans),
            vec![
                ("deep".to_string(), at(9, 0), at(9, 40)),
                ("admin".to_string(), at(9, 50), at(10, 20)),
            ]
        );
    }

    #[test]
    fn reservation_includes_follower_buffer_by_default() {
        let goals = vec![goal("deep", 60, 30, 10), goal("admin", 30, 30, 10)];

        let plans = BlockPacker::new().pack(&goals, &[slot((9, 0), (10, 20))]);

        assert_eq!(
            spans(&plans),
            vec![
                ("deep".to_string(), at(9, 0), at(9, 30)),
                ("admin".to_string(), at(9, 40), at(10, 10)),
            ]
        );
    }

    #[test]
    fn reservation_never_shrinks_below_own_minimum() {
        let goals = vec![goal("deep", 60, 60, 10), goal("admin", 30, 30, 10)];

        let plans = BlockPacker::new().pack(&goals, &[slot((9, 0), (10, 20))]);

        // Only 10 minutes remain after deep work and its buffer
        assert_eq!(spans(&plans), vec![("deep".to_string(), at(9, 0), at(10, 0))]);
    }

    #[test]
    fn skipped_goal_does_not_end_the_slot() {
        let goals = vec![goal("big", 120, 90, 5), goal("small", 30, 15, 5)];

        let plans = BlockPacker::new().pack(&goals, &[slot((9, 0), (10, 0))]);

        assert_eq!(spans(&plans), vec![("small".to_string(), at(9, 0), at(9, 30))]);
    }

    #[test]
    fn trailing_buffer_is_never_charged() {
        let goals = vec![goal("a", 60, 30, 15)];

        let plans = BlockPacker::new().pack(&goals, &[slot((9, 0), (10, 0))]);

        assert_eq!(spans(&plans), vec![("a".to_string(), at(9, 0), at(10, 0))]);
        assert_eq!(plans[0].idle(), Duration::zero());
    }

    #[test]
    fn allocation_carries_across_slots() {
        let goals = vec![goal("deep", 90, 30, 10)];

        let plans = BlockPacker::new().pack(&goals, &[slot((9, 0), (10, 0)), slot((13, 0), (15, 0))]);

        assert_eq!(
            spans(&plans),
            vec![
                ("deep".to_string(), at(9, 0), at(10, 0)),
                ("deep".to_string(), at(13, 0), at(13, 30)),
            ]
        );
        assert_eq!(plans[1].slot_index, 1);
    }

    #[test]
    fn leftover_need_below_minimum_is_not_materialized() {
        // 40 minutes leave a need of 10; splitting at the 30 minute minimum is impossible
        let goals = vec![goal("deep", 50, 30, 0)];

        let plans = BlockPacker::new().pack(&goals, &[slot((9, 0), (9, 40)), slot((13, 0), (15, 0))]);

        assert_eq!(spans(&plans), vec![("deep".to_string(), at(9, 0), at(9, 40))]);
        assert!(plans[1].blocks.is_empty());
    }

    #[test]
    fn block_is_trimmed_to_keep_remaining_need_servable() {
        // Taking all 50 minutes would strand a 10 minute need below the minimum
        let goals = vec![goal("deep", 60, 30, 0)];

        let plans = BlockPacker::new().pack(&goals, &[slot((9, 0), (9, 50)), slot((13, 0), (15, 0))]);

        assert_eq!(
            spans(&plans),
            vec![
                ("deep".to_string(), at(9, 0), at(9, 30)),
                ("deep".to_string(), at(13, 0), at(13, 30)),
            ]
        );
    }

    #[test]
    fn huge_buffer_means_the_follower_does_not_fit() {
        let goals = vec![goal("a", 30, 30, 10_000_000_000_000), goal("b", 30, 30, 0)];

        let plans = BlockPacker::new().pack(&goals, &[slot((9, 0), (12, 0))]);

        assert_eq!(spans(&plans), vec![("a".to_string(), at(9, 0), at(9, 30))]);
    }

    #[test]
    fn buffer_past_the_end_of_time_does_not_fit() {
        let goals = vec![goal("a", 30, 30, 60), goal("b", 30, 30, 0)];
        let end = DateTime::<Utc>::MAX_UTC;
        let late = FreeSlot::new(end - Duration::minutes(40), end).unwrap();

        let plans = BlockPacker::new().pack(&goals, &[late]);

        assert_eq!(plans[0].blocks.len(), 1);
        assert_eq!(plans[0].blocks[0].goal_id, "a");
    }

    #[test]
    fn lookahead_skips_satisfied_goals() {
        let goals = vec![goal("x", 90, 60, 0), goal("s", 30, 30, 0), goal("y", 30, 20, 0)];

        let plans = BlockPacker::new().pack(&goals, &[slot((8, 0), (8, 30)), slot((9, 0), (10, 40))]);

        // s is satisfied in the first slot, so x reserves for y's 20 minutes, not s's 30
        assert_eq!(
            spans(&plans),
            vec![
                ("s".to_string(), at(8, 0), at(8, 30)),
                ("x".to_string(), at(9, 0), at(10, 20)),
                ("y".to_string(), at(10, 20), at(10, 40)),
            ]
        );
    }

    #[test]
    fn empty_inputs_produce_empty_plans() {
        assert!(BlockPacker::new().pack(&[], &[slot((9, 0), (10, 0))])[0].blocks.is_empty());
        assert!(BlockPacker::new().pack(&[goal("a", 30, 15, 0)], &[]).is_empty());
    }
}
