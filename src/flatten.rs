//! Container flattening into the ordered set of leaves to animate.

use crate::tree::{Capabilities, ElementId, ElementKind, Tree};

/// Flatten a container into the leaves that should animate individually.
///
/// Walks the children depth-first in declared order, recursing into
/// nested containers. A collapsed child is skipped together with its whole
/// subtree, even if some descendant is itself marked visible. Leaves
/// without the ANIMATABLE capability are static and never returned.
pub fn flatten(tree: &Tree, container: ElementId) -> Vec<ElementId> {
    let mut leaves = Vec::new();
    flatten_into(tree, container, &mut leaves);
    leaves
}

/// Flatten into an existing buffer (clears it and reuses capacity).
pub fn flatten_into(tree: &Tree, container: ElementId, leaves: &mut Vec<ElementId>) {
    leaves.clear();
    flatten_children(tree, container, leaves);
}

fn flatten_children(tree: &Tree, container: ElementId, out: &mut Vec<ElementId>) {
    for &child in tree.children(container) {
        if !tree.visibility(child).is_visible() {
            continue;
        }
        match tree.kind(child) {
            Some(ElementKind::Container) => flatten_children(tree, child, out),
            Some(ElementKind::Leaf) => {
                if tree.capabilities(child).contains(Capabilities::ANIMATABLE) {
                    out.push(child);
                }
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Visibility;

    fn container_with_leaves(tree: &mut Tree, count: usize) -> (ElementId, Vec<ElementId>) {
        let root = tree.container();
        let leaves: Vec<_> = (0..count).map(|_| tree.leaf()).collect();
        for &leaf in &leaves {
            tree.append_child(root, leaf);
        }
        (root, leaves)
    }

    #[test]
    fn test_flatten_empty_container() {
        let mut tree = Tree::new();
        let root = tree.container();
        assert!(flatten(&tree, root).is_empty());
    }

    #[test]
    fn test_flatten_flat_container_keeps_order() {
        let mut tree = Tree::new();
        let (root, leaves) = container_with_leaves(&mut tree, 4);
        assert_eq!(flatten(&tree, root), leaves);
    }

    #[test]
    fn test_flatten_nested_is_preorder() {
        let mut tree = Tree::new();
        let root = tree.container();
        let a = tree.leaf();
        let inner = tree.container();
        let b = tree.leaf();
        let deeper = tree.container();
        let c = tree.leaf();
        let d = tree.leaf();

        tree.append_child(root, a);
        tree.append_child(root, inner);
        tree.append_child(inner, b);
        tree.append_child(inner, deeper);
        tree.append_child(deeper, c);
        tree.append_child(root, d);

        assert_eq!(flatten(&tree, root), vec![a, b, c, d]);
    }

    #[test]
    fn test_flatten_skips_collapsed_subtree() {
        let mut tree = Tree::new();
        let root = tree.container();
        let shown = tree.leaf();
        let hidden_group = tree.container();
        let under_hidden = tree.leaf();
        tree.append_child(root, shown);
        tree.append_child(root, hidden_group);
        tree.append_child(hidden_group, under_hidden);

        tree.set_visibility(hidden_group, Visibility::Collapsed);
        // Still marked visible, but its ancestor is collapsed
        tree.set_visibility(under_hidden, Visibility::Visible);

        assert_eq!(flatten(&tree, root), vec![shown]);
    }

    #[test]
    fn test_flatten_skips_collapsed_leaf() {
        let mut tree = Tree::new();
        let (root, leaves) = container_with_leaves(&mut tree, 3);
        tree.set_visibility(leaves[1], Visibility::Collapsed);

        assert_eq!(flatten(&tree, root), vec![leaves[0], leaves[2]]);
    }

    #[test]
    fn test_flatten_skips_static_leaves() {
        let mut tree = Tree::new();
        let root = tree.container();
        let fixed = tree.insert(ElementKind::Leaf, Capabilities::VISIBILITY);
        let moving = tree.leaf();
        tree.append_child(root, fixed);
        tree.append_child(root, moving);

        assert_eq!(flatten(&tree, root), vec![moving]);
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let mut tree = Tree::new();
        let (root, _) = container_with_leaves(&mut tree, 5);
        let first = flatten(&tree, root);
        let second = flatten(&tree, root);
        assert_eq!(first, second);
    }

    #[test]
    fn test_flatten_into_reuses_buffer() {
        let mut tree = Tree::new();
        let (root, leaves) = container_with_leaves(&mut tree, 2);
        let mut buffer = vec![root, root, root];

        flatten_into(&tree, root, &mut buffer);
        assert_eq!(buffer, leaves);
    }
}
