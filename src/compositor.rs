//! Host animation primitive.
//!
//! The compositor owns the actual timeline an offset animation runs on.
//! The engine only probes whether offset animation is available and then
//! fires animations; it never reads their progress back.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::animation::OffsetAnimation;
use crate::tree::ElementId;

pub trait Compositor {
    /// Whether the host can animate an element's vertical offset at all.
    /// When this is false the engine degrades to instant visibility toggles.
    fn supports_offset_animation(&self) -> bool;

    /// Start a keyframe animation on `element`'s vertical offset.
    fn start_offset_animation(&mut self, element: ElementId, animation: &OffsetAnimation);
}

impl<C: Compositor + ?Sized> Compositor for Box<C> {
    fn supports_offset_animation(&self) -> bool {
        (**self).supports_offset_animation()
    }

    fn start_offset_animation(&mut self, element: ElementId, animation: &OffsetAnimation) {
        (**self).start_offset_animation(element, animation);
    }
}

/// A started animation as seen by [`RecordingCompositor`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartedAnimation {
    pub element: ElementId,
    pub animation: OffsetAnimation,
    pub started_at: Instant,
}

/// Headless compositor that records every animation it is asked to start.
///
/// Useful for tests and for hosts that drive rendering themselves: the
/// current offset of any element can be sampled with [`offset_at`].
///
/// [`offset_at`]: RecordingCompositor::offset_at
#[derive(Debug)]
pub struct RecordingCompositor {
    supported: bool,
    started: Vec<StartedAnimation>,
    latest: HashMap<ElementId, usize>,
}

impl RecordingCompositor {
    pub fn new() -> Self {
        Self {
            supported: true,
            started: Vec::new(),
            latest: HashMap::new(),
        }
    }

    /// A compositor that reports no offset animation support
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// All starts in the order they happened
    pub fn started(&self) -> &[StartedAnimation] {
        &self.started
    }

    pub fn started_elements(&self) -> Vec<ElementId> {
        self.started.iter().map(|s| s.element).collect()
    }

    /// Forget everything recorded so far
    pub fn clear_history(&mut self) -> Vec<StartedAnimation> {
        self.latest.clear();
        std::mem::take(&mut self.started)
    }

    /// Offset of `element` at `now`, from the most recent animation started on it.
    /// Elements never animated sit at 0.
    pub fn offset_at(&self, element: ElementId, now: Instant) -> f32 {
        self.latest
            .get(&element)
            .map(|&idx| {
                let s = &self.started[idx];
                s.animation.sample(now.saturating_duration_since(s.started_at))
            })
            .unwrap_or(0.0)
    }

    /// Time at which every recorded animation has reached its last keyframe.
    ///
    /// `None` when nothing was recorded or an animation never ends.
    pub fn finished_at(&self) -> Option<Instant> {
        let mut latest = None;
        for s in &self.started {
            let end = s.started_at.checked_add(s.animation.duration)?;
            latest = latest.max(Some(end));
        }
        latest
    }
}

impl Default for RecordingCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor for RecordingCompositor {
    fn supports_offset_animation(&self) -> bool {
        self.supported
    }

    fn start_offset_animation(&mut self, element: ElementId, animation: &OffsetAnimation) {
        self.latest.insert(element, self.started.len());
        self.started.push(StartedAnimation {
            element,
            animation: *animation,
            started_at: Instant::now(),
        });
    }
}
