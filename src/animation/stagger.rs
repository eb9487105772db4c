//! Stagger sequencing: which entry starts next, and when.
//!
//! Show starts from the last leaf and works back to the first, hide goes
//! first to last. The nth started entry is due `n * inter_element_delay`
//! after the run starts. The run only sequences starts; it never waits for
//! an animation to finish.

use std::collections::VecDeque;
use std::time::Duration;

use super::{AnimationPlan, Direction, PlanEntry};

pub struct StaggerRun {
    direction: Direction,
    duration: Duration,
    inter_element_delay: Duration,
    pending: VecDeque<PlanEntry>,
    total: usize,
}

impl StaggerRun {
    pub fn new(plan: AnimationPlan, inter_element_delay: Duration) -> Self {
        let direction = plan.direction();
        let duration = plan.duration();
        let mut pending: VecDeque<PlanEntry> = plan.into_entries().into();
        if direction == Direction::Show {
            pending.make_contiguous().reverse();
        }
        let total = pending.len();
        Self {
            direction,
            duration,
            inter_element_delay,
            pending,
            total,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn inter_element_delay(&self) -> Duration {
        self.inter_element_delay
    }

    /// Take the next entry to start, in stagger order
    pub fn next_entry(&mut self) -> Option<PlanEntry> {
        self.pending.pop_front()
    }

    /// Number of entries already handed out
    pub fn started(&self) -> usize {
        self.total - self.pending.len()
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Planned start of the `step`th entry relative to the run start
    pub fn start_offset(&self, step: usize) -> Duration {
        self.inter_element_delay.saturating_mul(saturating_count(step))
    }

    /// Estimated time until every animation in this run has finished
    pub fn settle_time(&self) -> Duration {
        settle_time(self.total, self.duration, self.inter_element_delay)
    }
}

impl std::fmt::Debug for StaggerRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaggerRun")
            .field("direction", &self.direction)
            .field("started", &self.started())
            .field("total", &self.total)
            .finish()
    }
}

/// `duration + element_count * inter_element_delay`, saturating at [`Duration::MAX`]
pub fn settle_time(
    element_count: usize,
    duration: Duration,
    inter_element_delay: Duration,
) -> Duration {
    duration.saturating_add(inter_element_delay.saturating_mul(saturating_count(element_count)))
}

fn saturating_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
