//! Staggered reveal/hide choreography for hierarchical visual containers.
//!
//! A [`Stage`] mirrors the host's container tree, flattens a container into
//! its visible leaves and starts one vertical slide per leaf with a small
//! fixed delay between them, producing a cascading "unfurl". All waiting
//! happens on a single-threaded [`calloop`] event loop.

pub mod animation;
pub mod compositor;
mod error;
pub mod flatten;
pub mod layout;
pub mod stage;
pub mod tree;

use std::time::Duration;

pub use error::{Error, Result};
pub use stage::{LifecycleState, Stage};

pub mod prelude {
    pub use crate::animation::{Direction, OffsetAnimation};
    pub use crate::compositor::{Compositor, RecordingCompositor};
    pub use crate::flatten::flatten;
    pub use crate::tree::{Capabilities, ElementId, ElementKind, Tree, Visibility};
    pub use crate::{Error, LifecycleState, Result, Stage, StageConfig};
}

/// Slide duration used when a request passes none (or zero)
pub const DEFAULT_DURATION: Duration = Duration::from_millis(300);
/// Gap between consecutive leaf starts
pub const DEFAULT_INTER_ELEMENT_DELAY: Duration = Duration::from_millis(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageConfig {
    pub default_duration: Duration,
    pub inter_element_delay: Duration,
}

impl StageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_duration(mut self, duration: Duration) -> Self {
        if !duration.is_zero() {
            self.default_duration = duration;
        }
        self
    }

    pub fn inter_element_delay(mut self, delay: Duration) -> Self {
        self.inter_element_delay = delay;
        self
    }

    /// The requested duration, or the default when none or zero was given
    pub fn resolve_duration(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(duration) if !duration.is_zero() => duration,
            _ => self.default_duration,
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            default_duration: DEFAULT_DURATION,
            inter_element_delay: DEFAULT_INTER_ELEMENT_DELAY,
        }
    }
}
