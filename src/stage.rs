//! Visibility lifecycle coordination.
//!
//! The [`Stage`] bridges a container's visible/collapsed flag to the
//! flatten → plan → stagger pipeline:
//!
//! - **show** makes the container visible right away. If it has never been
//!   laid out (height 0) the cascade waits for a one-shot layout signal
//!   delivered through [`Stage::complete_layout`].
//! - **hide** cascades the content out first and collapses the container
//!   once the estimated settle time has passed.
//!
//! Both waits are calloop timers on the loop the stage was created with, so
//! every tree mutation happens on the loop's thread. A new request for a
//! container that is still animating supersedes the running one: its
//! pending timers and layout listener are cancelled before the new run
//! starts.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};

use crate::animation::{Direction, PlanEntry, StaggerRun, build_plan, settle_time};
use crate::compositor::Compositor;
use crate::error::{Error, Result};
use crate::flatten::flatten;
use crate::layout::{LayoutListeners, ListenerId};
use crate::tree::{ElementId, ElementKind, Tree, Visibility};
use crate::StageConfig;

/// Where a container is in its show/hide lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LifecycleState {
    /// Never shown or hidden through the stage
    #[default]
    Idle,
    /// Shown before its first layout; cascade waits for a height
    AwaitingFirstLayout,
    /// Stagger in progress (or, for hide, waiting to collapse)
    Animating,
    /// Last request fully applied
    Settled,
}

/// Per-container bookkeeping owned by the stage
#[derive(Debug, Default)]
struct LifecycleRecord {
    state: LifecycleState,
    direction: Option<Direction>,
    /// Duration requested by a show that is waiting for layout
    pending_duration: Option<Duration>,
    stagger: Option<RegistrationToken>,
    collapse: Option<RegistrationToken>,
    layout_listener: Option<ListenerId>,
}

impl LifecycleRecord {
    fn is_in_flight(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::Animating | LifecycleState::AwaitingFirstLayout
        )
    }
}

pub struct Stage<'l, C> {
    tree: Tree,
    compositor: C,
    config: StageConfig,
    handle: LoopHandle<'l, Stage<'l, C>>,
    records: HashMap<ElementId, LifecycleRecord>,
    layout_listeners: LayoutListeners<'l, Stage<'l, C>, Result<()>>,
}

impl<'l, C: Compositor + 'l> Stage<'l, C> {
    pub fn new(
        handle: LoopHandle<'l, Stage<'l, C>>,
        tree: Tree,
        compositor: C,
        config: StageConfig,
    ) -> Self {
        Self {
            tree,
            compositor,
            config,
            handle,
            records: HashMap::new(),
            layout_listeners: LayoutListeners::new(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Mutable access to the tree. Removed containers are forgotten on the
    /// next `show`/`hide`, or right away through [`Stage::prune`].
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut C {
        &mut self.compositor
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn into_parts(self) -> (Tree, C) {
        (self.tree, self.compositor)
    }

    pub fn state(&self, container: ElementId) -> LifecycleState {
        self.records
            .get(&container)
            .map_or(LifecycleState::Idle, |r| r.state)
    }

    /// True while a cascade is running or waiting for layout
    pub fn is_animating(&self, container: ElementId) -> bool {
        self.records
            .get(&container)
            .is_some_and(LifecycleRecord::is_in_flight)
    }

    /// Estimated time for `element_count` staggered slides of `duration` to finish
    pub fn settle_time(
        &self,
        element_count: usize,
        duration: impl Into<Option<Duration>>,
    ) -> Duration {
        settle_time(
            element_count,
            self.config.resolve_duration(duration.into()),
            self.config.inter_element_delay,
        )
    }

    /// Reveal a container and cascade its content in.
    ///
    /// `None` or a zero duration selects the configured default.
    pub fn show(
        &mut self,
        container: ElementId,
        duration: impl Into<Option<Duration>>,
    ) -> Result<()> {
        self.prune();
        self.check_container(container)?;
        let duration = self.config.resolve_duration(duration.into());
        self.supersede(container);

        self.tree.set_visibility(container, Visibility::Visible);

        if !self.compositor.supports_offset_animation() {
            log::debug!("{container}: offset animation unsupported, showing instantly");
            self.settle(container, Direction::Show);
            return Ok(());
        }

        let height = self.tree.height(container);
        if height <= 0.0 {
            return self.await_layout(container, duration);
        }
        self.animate(container, height, duration, Direction::Show)
    }

    /// Cascade a container's content out, then collapse it.
    ///
    /// The collapse happens after `duration + leaves * inter_element_delay`.
    /// Hiding a container that is already collapsed and idle does nothing.
    pub fn hide(
        &mut self,
        container: ElementId,
        duration: impl Into<Option<Duration>>,
    ) -> Result<()> {
        self.prune();
        self.check_container(container)?;
        let duration = self.config.resolve_duration(duration.into());

        if !self.is_animating(container) && !self.tree.visibility(container).is_visible() {
            log::debug!("{container}: already collapsed");
            return Ok(());
        }
        self.supersede(container);

        let height = self.tree.height(container);
        if !self.compositor.supports_offset_animation() || height <= 0.0 {
            log::debug!("{container}: nothing to animate, collapsing instantly");
            self.tree.set_visibility(container, Visibility::Collapsed);
            self.settle(container, Direction::Hide);
            return Ok(());
        }
        self.animate(container, height, duration, Direction::Hide)
    }

    /// Show a collapsed (or hiding) container, hide a visible one.
    pub fn toggle(
        &mut self,
        container: ElementId,
        duration: impl Into<Option<Duration>>,
    ) -> Result<()> {
        let hiding = self
            .records
            .get(&container)
            .is_some_and(|r| r.is_in_flight() && r.direction == Some(Direction::Hide));
        if hiding || !self.tree.visibility(container).is_visible() {
            self.show(container, duration)
        } else {
            self.hide(container, duration)
        }
    }

    /// Record a container's measured height and fire its layout listeners.
    ///
    /// Hosts call this after every layout pass that touched the container.
    pub fn complete_layout(&mut self, container: ElementId, height: f32) -> Result<()> {
        if !self.tree.contains(container) {
            return Err(Error::UnknownElement(container));
        }
        self.tree.set_height(container, height);

        let mut result = Ok(());
        for callback in self.layout_listeners.take(container) {
            let outcome = callback(self, height);
            if result.is_ok() {
                result = outcome;
            }
        }
        result
    }

    /// Drop all bookkeeping for a container, cancelling anything pending.
    ///
    /// Call this when the host destroys the container.
    pub fn forget(&mut self, container: ElementId) {
        self.cancel_pending(container);
        self.records.remove(&container);
    }

    /// Forget every container that has been removed from the tree.
    ///
    /// `show` and `hide` run this themselves, so hosts that remove
    /// containers through [`Stage::tree_mut`] don't leak bookkeeping.
    pub fn prune(&mut self) {
        let removed: Vec<_> = self
            .records
            .keys()
            .copied()
            .filter(|&id| !self.tree.contains(id))
            .collect();
        for container in removed {
            log::debug!("{container}: removed from the tree, forgetting");
            self.forget(container);
        }
    }

    fn check_container(&self, container: ElementId) -> Result<()> {
        match self.tree.kind(container) {
            Some(ElementKind::Container) => Ok(()),
            Some(ElementKind::Leaf) => Err(Error::NotAContainer(container)),
            None => Err(Error::UnknownElement(container)),
        }
    }

    fn record_mut(&mut self, container: ElementId) -> &mut LifecycleRecord {
        self.records.entry(container).or_default()
    }

    /// Cancel a run still in flight for `container`.
    fn supersede(&mut self, container: ElementId) {
        if self.is_animating(container) {
            log::warn!(
                "{container}: new request while {:?}, superseding",
                self.state(container)
            );
            self.cancel_pending(container);
        }
    }

    fn cancel_pending(&mut self, container: ElementId) {
        let Some(record) = self.records.get_mut(&container) else {
            return;
        };
        if let Some(token) = record.stagger.take() {
            self.handle.remove(token);
        }
        if let Some(token) = record.collapse.take() {
            self.handle.remove(token);
        }
        if let Some(id) = record.layout_listener.take() {
            self.layout_listeners.cancel(id);
        }
        record.pending_duration = None;
    }

    fn settle(&mut self, container: ElementId, direction: Direction) {
        let record = self.record_mut(container);
        record.state = LifecycleState::Settled;
        record.direction = Some(direction);
        log::debug!("{container}: settled after {direction:?}");
    }

    fn await_layout(&mut self, container: ElementId, duration: Duration) -> Result<()> {
        log::debug!("{container}: not laid out yet, waiting for layout");
        let listener = self.layout_listeners.once(container, move |stage: &mut Self, height| {
            stage.on_first_layout(container, height)
        });
        let record = self.record_mut(container);
        record.state = LifecycleState::AwaitingFirstLayout;
        record.direction = Some(Direction::Show);
        record.pending_duration = Some(duration);
        record.layout_listener = Some(listener);
        Ok(())
    }

    fn on_first_layout(&mut self, container: ElementId, height: f32) -> Result<()> {
        let default_duration = self.config.default_duration;
        let record = self.record_mut(container);
        record.layout_listener = None;
        let duration = record.pending_duration.take().unwrap_or(default_duration);

        if height <= 0.0 {
            return self.await_layout(container, duration);
        }
        log::debug!("{container}: first layout done, height {height}");
        self.animate(container, height, duration, Direction::Show)
    }

    /// Flatten, plan and start the staggered run for `container`.
    ///
    /// Timers are registered before the tree or the record is touched, so a
    /// registration failure leaves nothing half-started.
    fn animate(
        &mut self,
        container: ElementId,
        height: f32,
        duration: Duration,
        direction: Direction,
    ) -> Result<()> {
        let leaves = flatten(&self.tree, container);
        let plan = build_plan(&leaves, height, duration, direction);

        let delay = self.config.inter_element_delay;
        let mut run = StaggerRun::new(plan.clone(), delay);
        let settle_after = run.settle_time();
        log::debug!(
            "{container}: {direction:?} {} leaves over height {height}, settles in {settle_after:?}",
            run.len()
        );

        // First leaf starts immediately; the rest follow on the timer
        let first = run.next_entry();
        let (stagger, collapse) = match self.schedule(container, run, settle_after) {
            Ok(tokens) => tokens,
            Err(err) => return Err(self.abandon(container, direction, err)),
        };

        plan.prime(&mut self.tree);
        let record = self.record_mut(container);
        record.state = LifecycleState::Animating;
        record.direction = Some(direction);
        record.stagger = stagger;
        record.collapse = collapse;

        if let Some(entry) = first {
            self.start_entry(0, entry, direction);
        }
        if stagger.is_none() {
            self.stagger_finished(container, direction);
        }
        Ok(())
    }

    /// Register the stagger timer (if any entries remain) and, for hide, the
    /// collapse timer.
    fn schedule(
        &self,
        container: ElementId,
        mut run: StaggerRun,
        settle_after: Duration,
    ) -> calloop::Result<(Option<RegistrationToken>, Option<RegistrationToken>)> {
        let direction = run.direction();
        let delay = run.inter_element_delay();

        let stagger = if run.is_finished() {
            None
        } else {
            let token = self
                .handle
                .insert_source(
                    Timer::from_duration(delay),
                    move |deadline: Instant, _: &mut (), stage: &mut Self| {
                        if !stage.tree.contains(container) {
                            // This timer drops itself; forget cancels the rest
                            stage.record_mut(container).stagger = None;
                            stage.forget(container);
                            return TimeoutAction::Drop;
                        }
                        let step = run.started();
                        if let Some(entry) = run.next_entry() {
                            stage.start_entry(step, entry, direction);
                        }
                        if run.is_finished() {
                            stage.stagger_finished(container, direction);
                            return TimeoutAction::Drop;
                        }
                        match deadline.checked_add(delay) {
                            Some(next) => TimeoutAction::ToInstant(next),
                            None => {
                                log::warn!("{container}: next start is out of range, stopping");
                                TimeoutAction::Drop
                            }
                        }
                    },
                )
                .map_err(|e| e.error)?;
            Some(token)
        };

        if direction == Direction::Show {
            return Ok((stagger, None));
        }
        let collapse = self.handle.insert_source(
            Timer::from_duration(settle_after),
            move |_: Instant, _: &mut (), stage: &mut Self| {
                stage.collapse(container);
                TimeoutAction::Drop
            },
        );
        match collapse {
            Ok(token) => Ok((stagger, Some(token))),
            Err(err) => {
                if let Some(token) = stagger {
                    self.handle.remove(token);
                }
                Err(err.error)
            }
        }
    }

    /// Apply a request without animation after its timers failed to register.
    fn abandon(
        &mut self,
        container: ElementId,
        direction: Direction,
        err: calloop::Error,
    ) -> Error {
        log::error!("{container}: could not schedule {direction:?} cascade: {err}");
        self.cancel_pending(container);
        if direction == Direction::Hide {
            self.tree.set_visibility(container, Visibility::Collapsed);
        }
        self.settle(container, direction);
        Error::Loop(err)
    }

    fn start_entry(&mut self, step: usize, entry: PlanEntry, direction: Direction) {
        if !self.tree.contains(entry.leaf) {
            log::debug!("leaf {} vanished mid-run, skipping", entry.leaf);
            return;
        }
        if direction == Direction::Show {
            self.tree.set_opacity(entry.leaf, 1.0);
        }
        log::trace!(
            "step {step}: {} offset {} -> {} over {:?}",
            entry.leaf,
            entry.animation.from,
            entry.animation.to,
            entry.animation.duration
        );
        self.compositor.start_offset_animation(entry.leaf, &entry.animation);
    }

    fn stagger_finished(&mut self, container: ElementId, direction: Direction) {
        self.record_mut(container).stagger = None;
        if direction == Direction::Show {
            self.settle(container, direction);
        }
    }

    fn collapse(&mut self, container: ElementId) {
        self.record_mut(container).collapse = None;
        if !self.tree.contains(container) {
            log::debug!("{container}: removed before collapsing, forgetting");
            self.forget(container);
            return;
        }
        self.tree.set_visibility(container, Visibility::Collapsed);
        self.settle(container, Direction::Hide);
    }
}

impl<C> std::fmt::Debug for Stage<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("elements", &self.tree.len())
            .field("config", &self.config)
            .field("records", &self.records)
            .field("layout_listeners", &self.layout_listeners.len())
            .finish()
    }
}
