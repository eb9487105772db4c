mod plan;
mod stagger;

use std::time::Duration;

pub use plan::{AnimationPlan, PlanEntry, build_plan};
pub use stagger::{StaggerRun, settle_time};

/// Which way content is moving
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Content cascades in (slides down from above, fades in)
    Show,
    /// Content cascades out (slides up out of view)
    Hide,
}

/// A two-keyframe, linear vertical offset animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OffsetAnimation {
    /// Offset at the first keyframe
    pub from: f32,
    /// Offset at the last keyframe
    pub to: f32,
    /// Time from first to last keyframe
    pub duration: Duration,
}

impl OffsetAnimation {
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self { from, to, duration }
    }

    /// Offset after `elapsed` time since the animation started.
    /// Clamps to the end keyframe once the duration has passed.
    pub fn sample(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() {
            return self.to;
        }
        let t = (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0);
        self.from + (self.to - self.from) * t
    }
}
