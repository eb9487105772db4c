//! Per-leaf animation plans derived from a container's measured height.

use std::time::Duration;

use crate::tree::{ElementId, Tree};

use super::{Direction, OffsetAnimation};

/// One leaf's animation within a show/hide run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanEntry {
    pub leaf: ElementId,
    pub animation: OffsetAnimation,
}

/// Ordered animation entries for one show/hide invocation.
///
/// Entries follow flatten order regardless of direction; the stagger run
/// decides in which order they are started.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationPlan {
    direction: Direction,
    duration: Duration,
    entries: Vec<PlanEntry>,
}

/// Build one offset animation per leaf.
///
/// Show slides each leaf from `-container_height` to 0, hide from 0 to
/// `-container_height`. The height is sampled once by the caller, so every
/// leaf moves relative to the same container extent. Callers must not
/// build a plan while the container is still unmeasured (height 0).
pub fn build_plan(
    leaves: &[ElementId],
    container_height: f32,
    duration: Duration,
    direction: Direction,
) -> AnimationPlan {
    let (from, to) = match direction {
        Direction::Show => (-container_height, 0.0),
        Direction::Hide => (0.0, -container_height),
    };
    let entries = leaves
        .iter()
        .map(|&leaf| PlanEntry {
            leaf,
            animation: OffsetAnimation::new(from, to, duration),
        })
        .collect();

    AnimationPlan {
        direction,
        duration,
        entries,
    }
}

impl AnimationPlan {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Put every leaf in its pre-animation state.
    ///
    /// Enables offset animation on each leaf. For show, also forces opacity
    /// to 0 so a leaf stays invisible until its own animation starts; hide
    /// leaves opacity alone.
    pub fn prime(&self, tree: &mut Tree) {
        for entry in &self.entries {
            tree.enable_offset_animation(entry.leaf);
            if self.direction == Direction::Show {
                tree.set_opacity(entry.leaf, 0.0);
            }
        }
    }

    pub(crate) fn into_entries(self) -> Vec<PlanEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(tree: &mut Tree, n: usize) -> Vec<ElementId> {
        (0..n).map(|_| tree.leaf()).collect()
    }

    #[test]
    fn test_show_plan_slides_down_to_rest() {
        let mut tree = Tree::new();
        let ids = leaves(&mut tree, 3);
        let plan = build_plan(&ids, 90.0, Duration::from_millis(300), Direction::Show);

        assert_eq!(plan.len(), 3);
        for (entry, &id) in plan.entries().iter().zip(&ids) {
            assert_eq!(entry.leaf, id);
            assert_eq!(entry.animation.from, -90.0);
            assert_eq!(entry.animation.to, 0.0);
            assert_eq!(entry.animation.duration, Duration::from_millis(300));
        }
    }

    #[test]
    fn test_hide_plan_slides_up_out_of_view() {
        let mut tree = Tree::new();
        let ids = leaves(&mut tree, 2);
        let plan = build_plan(&ids, 40.0, Duration::from_millis(120), Direction::Hide);

        for entry in plan.entries() {
            assert_eq!(entry.animation.from, 0.0);
            assert_eq!(entry.animation.to, -40.0);
        }
        assert_eq!(plan.direction(), Direction::Hide);
    }

    #[test]
    fn test_empty_plan() {
        let plan = build_plan(&[], 90.0, Duration::from_millis(300), Direction::Show);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_prime_show_hides_leaves() {
        let mut tree = Tree::new();
        let ids = leaves(&mut tree, 2);
        let plan = build_plan(&ids, 10.0, Duration::from_millis(50), Direction::Show);

        plan.prime(&mut tree);

        for &id in &ids {
            assert_eq!(tree.opacity(id), 0.0);
            assert!(tree.is_offset_animation_enabled(id));
        }
    }

    #[test]
    fn test_prime_hide_keeps_opacity() {
        let mut tree = Tree::new();
        let ids = leaves(&mut tree, 2);
        tree.set_opacity(ids[1], 0.5);
        let plan = build_plan(&ids, 10.0, Duration::from_millis(50), Direction::Hide);

        plan.prime(&mut tree);

        assert_eq!(tree.opacity(ids[0]), 1.0);
        assert_eq!(tree.opacity(ids[1]), 0.5);
        assert!(tree.is_offset_animation_enabled(ids[0]));
    }
}
