//! Arena-based element storage mirroring the host's visual tree.
//!
//! The Tree holds every container and leaf the choreography engine may
//! touch, using a sparse-set architecture with generational indices.
//!
//! ## Key Features
//!
//! - **Generational Indices**: ElementId contains index + generation so a
//!   stale id never aliases an element allocated later in the same slot.
//!
//! - **Dense Storage**: Nodes stored contiguously; removal is swap-remove.
//!
//! - **Ordered Children**: Each container owns an ordered child list. The
//!   order is the visual top-to-bottom order used by flattening.
//!
//! - **Element State**: Visibility, measured height, opacity and the
//!   offset-animation switch live on the node, so the engine only needs an
//!   `ElementId` to read or drive an element.

use bitflags::bitflags;

bitflags! {
    /// Capability set an element exposes to the engine
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Element owns an ordered child list
        const CONTAINER  = 0b001;
        /// Element carries a visibility flag
        const VISIBILITY = 0b010;
        /// Element exposes an animatable vertical offset
        const ANIMATABLE = 0b100;
    }
}

/// Unique identifier for an element in the tree.
///
/// Uses a generational index design:
/// - `index`: Position in the sparse array (reusable after removal)
/// - `generation`: Version counter that increments when a slot is reused
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ElementId {
    index: u32,
    generation: u32,
}

impl ElementId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// What an element is. Closed set: every element is one or the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// Owns an ordered sequence of children
    Container,
    /// Atomic visual element, animated individually
    Leaf,
}

/// Visibility flag of an element
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    Collapsed,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }
}

/// Entry in the sparse map, pointing to a dense array slot.
struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

/// A node in the tree, containing an element's state and its links.
struct Node {
    kind: ElementKind,
    capabilities: Capabilities,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    visibility: Visibility,
    /// Measured height from the host's last layout; 0 until laid out
    height: f32,
    opacity: f32,
    offset_animation_enabled: bool,
    /// Back-pointer to sparse array index (for swap-remove fixup)
    sparse_index: u32,
}

/// Central element storage using an arena-based sparse-set architecture.
pub struct Tree {
    dense: Vec<Node>,
    sparse: Vec<Option<SparseEntry>>,
    free_indices: Vec<u32>,
}

impl Tree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            free_indices: Vec::new(),
        }
    }

    /// Create a container with the full capability set.
    pub fn container(&mut self) -> ElementId {
        self.insert(ElementKind::Container, Capabilities::all())
    }

    /// Create a visible, animatable leaf.
    pub fn leaf(&mut self) -> ElementId {
        self.insert(ElementKind::Leaf, Capabilities::VISIBILITY | Capabilities::ANIMATABLE)
    }

    /// Register an element and return its unique ID.
    ///
    /// The CONTAINER capability always follows `kind`, whatever the caller
    /// passed in `capabilities`.
    pub fn insert(&mut self, kind: ElementKind, capabilities: Capabilities) -> ElementId {
        let mut capabilities = capabilities;
        capabilities.set(Capabilities::CONTAINER, kind == ElementKind::Container);

        let (sparse_index, generation) = if let Some(idx) = self.free_indices.pop() {
            // Reuse a freed slot - bump its generation
            let old_gen = self.sparse[idx as usize]
                .as_ref()
                .map(|e| e.generation)
                .unwrap_or(0);
            (idx, old_gen.wrapping_add(1))
        } else {
            let idx = self.sparse.len() as u32;
            self.sparse.push(None);
            (idx, 0)
        };

        let dense_index = self.dense.len();
        self.dense.push(Node {
            kind,
            capabilities,
            parent: None,
            children: Vec::new(),
            visibility: Visibility::Visible,
            height: 0.0,
            opacity: 1.0,
            offset_animation_enabled: false,
            sparse_index,
        });

        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index,
            generation,
        });

        ElementId::new(sparse_index, generation)
    }

    /// Remove an element and its whole subtree.
    ///
    /// Also removes the element from its parent's children list.
    pub fn remove(&mut self, id: ElementId) {
        let Some(dense_index) = self.get_dense_index(id) else {
            return;
        };

        if let Some(parent_id) = self.dense[dense_index].parent
            && let Some(parent_dense) = self.get_dense_index(parent_id)
        {
            self.dense[parent_dense].children.retain(|&c| c != id);
        }

        let children = std::mem::take(&mut self.dense[dense_index].children);
        for child in children {
            // Detach first so the recursive call doesn't touch our list
            if let Some(child_dense) = self.get_dense_index(child) {
                self.dense[child_dense].parent = None;
            }
            self.remove(child);
        }

        // Dense index may have moved while removing descendants
        let Some(dense_index) = self.get_dense_index(id) else {
            return;
        };
        let last_dense_index = self.dense.len() - 1;
        self.dense.swap_remove(dense_index);

        if dense_index != last_dense_index {
            let moved_sparse_idx = self.dense[dense_index].sparse_index;
            if let Some(ref mut entry) = self.sparse[moved_sparse_idx as usize] {
                entry.dense_index = dense_index;
            }
        }

        // Keep the generation around so the slot's next tenant gets a new one
        self.sparse[id.index as usize] = Some(SparseEntry {
            dense_index: usize::MAX,
            generation: id.generation,
        });
        self.free_indices.push(id.index);
    }

    fn get_dense_index(&self, id: ElementId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation && e.dense_index != usize::MAX)
            .map(|e| e.dense_index)
    }

    fn node(&self, id: ElementId) -> Option<&Node> {
        self.get_dense_index(id).map(|idx| &self.dense[idx])
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        let idx = self.get_dense_index(id)?;
        Some(&mut self.dense[idx])
    }

    /// Check if an element ID is valid (exists and has the right generation).
    pub fn contains(&self, id: ElementId) -> bool {
        self.get_dense_index(id).is_some()
    }

    /// Append `child` to the end of `parent`'s children.
    ///
    /// Does nothing if `parent` is not a container or either id is stale.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        let len = self.node(parent).map_or(0, |n| n.children.len());
        self.insert_child(parent, len, child);
    }

    /// Insert `child` into `parent`'s children at `index` (clamped).
    ///
    /// A child that already has a parent is detached from it first.
    pub fn insert_child(&mut self, parent: ElementId, index: usize, child: ElementId) {
        if parent == child || !self.contains(child) || self.is_ancestor(child, parent) {
            return;
        }
        match self.node(parent) {
            Some(node) if node.kind == ElementKind::Container => {}
            _ => return,
        }

        if let Some(old_parent) = self.parent(child)
            && let Some(old) = self.node_mut(old_parent)
        {
            old.children.retain(|&c| c != child);
        }

        if let Some(node) = self.node_mut(parent) {
            let index = index.min(node.children.len());
            node.children.insert(index, child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Ordered children of an element (empty for leaves and stale ids).
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn kind(&self, id: ElementId) -> Option<ElementKind> {
        self.node(id).map(|n| n.kind)
    }

    pub fn capabilities(&self, id: ElementId) -> Capabilities {
        self.node(id).map_or(Capabilities::empty(), |n| n.capabilities)
    }

    /// Effective visibility. Elements without a visibility flag count as visible.
    pub fn visibility(&self, id: ElementId) -> Visibility {
        match self.node(id) {
            Some(n) if n.capabilities.contains(Capabilities::VISIBILITY) => n.visibility,
            Some(_) => Visibility::Visible,
            None => Visibility::Collapsed,
        }
    }

    pub fn set_visibility(&mut self, id: ElementId, visibility: Visibility) {
        if let Some(node) = self.node_mut(id) {
            node.visibility = visibility;
        }
    }

    /// Measured height from the host's last layout pass (0 = not laid out).
    pub fn height(&self, id: ElementId) -> f32 {
        self.node(id).map_or(0.0, |n| n.height)
    }

    pub fn set_height(&mut self, id: ElementId, height: f32) {
        if let Some(node) = self.node_mut(id) {
            node.height = height.max(0.0);
        }
    }

    pub fn opacity(&self, id: ElementId) -> f32 {
        self.node(id).map_or(0.0, |n| n.opacity)
    }

    pub fn set_opacity(&mut self, id: ElementId, opacity: f32) {
        if let Some(node) = self.node_mut(id) {
            node.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    pub fn is_offset_animation_enabled(&self, id: ElementId) -> bool {
        self.node(id).is_some_and(|n| n.offset_animation_enabled)
    }

    /// Flip the element's "offset is animatable" switch on.
    pub fn enable_offset_animation(&mut self, id: ElementId) {
        if let Some(node) = self.node_mut(id)
            && node.capabilities.contains(Capabilities::ANIMATABLE)
        {
            node.offset_animation_enabled = true;
        }
    }

    /// Number of live elements
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
