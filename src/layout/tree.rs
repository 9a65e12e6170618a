//! Binary tree layout.
//!
//! Nodes are selected breadth-first from the root up to the node cap, so a
//! truncated tree keeps the levels nearest the root. Horizontal placement is
//! sized by rendered content: every node owns an interval whose width is
//! derived from its subtree.
//!
//! ```text
//! leaf            1 unit
//! two children    width(left) + width(right)
//! one child       width(child) + 1/2, the child pushed toward its side
//! ```
//!
//! A node sits at least half a unit inside its interval, so nodes on the same
//! level never overlap, and total width is bounded by the number of rendered
//! nodes rather than by `2^depth`. A 13-node left spine is 7 units wide while
//! a complete 15-node tree is 8.

use std::collections::{HashSet, VecDeque};

use super::{Layout, LayoutEdge, LayoutNode};
use crate::config::LayoutSettings;
use crate::trace::TreeValue;

/// Extra width a one-child node adds on its empty side
const SINGLE_CHILD_OFFSET: f64 = 0.5;

/// Layout-time view of one selected node
struct Slot<'a> {
    id: &'a str,
    depth: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Lay out a binary tree, rendering at most `max_nodes` nodes
pub fn layout_tree(tree: &TreeValue, settings: &LayoutSettings, max_nodes: usize) -> Layout {
    let Some(root) = tree.root() else {
        return Layout::empty(settings);
    };

    let (slots, overflow) = select_breadth_first(tree, root.id.as_str(), max_nodes);
    if slots.is_empty() {
        return Layout {
            overflow,
            ..Layout::empty(settings)
        };
    }

    // Children always follow their parent in BFS order, so a reverse sweep
    // sees every child before its parent.
    let mut width = vec![0.0f64; slots.len()];
    for i in (0..slots.len()).rev() {
        width[i] = match (slots[i].left, slots[i].right) {
            (None, None) => 1.0,
            (Some(l), Some(r)) => width[l] + width[r],
            (Some(c), None) | (None, Some(c)) => width[c] + SINGLE_CHILD_OFFSET,
        };
    }

    let mut start = vec![0.0f64; slots.len()];
    for i in 0..slots.len() {
        match (slots[i].left, slots[i].right) {
            (Some(l), Some(r)) => {
                start[l] = start[i];
                start[r] = start[i] + width[l];
            }
            (Some(l), None) => start[l] = start[i],
            (None, Some(r)) => start[r] = start[i] + SINGLE_CHILD_OFFSET,
            (None, None) => {}
        }
    }

    let mut center = vec![0.0f64; slots.len()];
    for i in (0..slots.len()).rev() {
        center[i] = match (slots[i].left, slots[i].right) {
            (None, None) => start[i] + 0.5,
            (Some(l), Some(r)) => (center[l] + center[r]) / 2.0,
            (Some(l), None) => center[l] + SINGLE_CHILD_OFFSET,
            (None, Some(r)) => center[r] - SINGLE_CHILD_OFFSET,
        };
    }

    let unit = settings.slot_width();
    let half = settings.node_size / 2.0;
    let max_depth = slots.iter().map(|s| s.depth).max().unwrap_or(0);

    let nodes = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            LayoutNode::new(
                slot.id,
                center[i] * unit,
                half + slot.depth as f64 * settings.level_spacing,
            )
        })
        .collect();

    let mut edges = Vec::with_capacity(slots.len().saturating_sub(1));
    for slot in &slots {
        for child in [slot.left, slot.right].into_iter().flatten() {
            edges.push(LayoutEdge::between(slot.id, slots[child].id, false));
        }
    }

    Layout {
        nodes,
        edges,
        width: width[0] * unit,
        height: settings.node_size + max_depth as f64 * settings.level_spacing,
        overflow,
    }
}

/// Breadth-first selection from the root. Returns the selected slots in BFS
/// order and the number of reachable nodes left out by the cap.
///
/// Dangling child ids are skipped, and a node reachable twice is only laid
/// out under its first parent.
fn select_breadth_first<'a>(
    tree: &'a TreeValue,
    root_id: &'a str,
    max_nodes: usize,
) -> (Vec<Slot<'a>>, usize) {
    let mut slots: Vec<Slot<'a>> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::from([root_id]);
    // (node id, depth, parent slot, is left child)
    let mut queue: VecDeque<(&str, usize, Option<(usize, bool)>)> =
        VecDeque::from([(root_id, 0, None)]);
    let mut overflow = 0;

    while let Some((id, depth, parent)) = queue.pop_front() {
        let Some(node) = tree.node(id) else {
            continue;
        };

        let this_slot = (slots.len() < max_nodes).then_some(slots.len());
        if let Some(index) = this_slot {
            slots.push(Slot {
                id: node.id.as_str(),
                depth,
                left: None,
                right: None,
            });
            if let Some((p, is_left)) = parent {
                if is_left {
                    slots[p].left = Some(index);
                } else {
                    slots[p].right = Some(index);
                }
            }
        } else {
            overflow += 1;
        }

        for (child, is_left) in [(node.left.as_deref(), true), (node.right.as_deref(), false)] {
            let Some(child) = child else {
                continue;
            };
            if !tree.contains(child) || !visited.insert(child) {
                continue;
            }
            queue.push_back((child, depth + 1, this_slot.map(|s| (s, is_left))));
        }
    }

    if overflow > 0 {
        tracing::debug!("Tree layout truncated: {} nodes over the cap", overflow);
    }
    (slots, overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{TraceValue, TreeNode};
    use proptest::prelude::*;

    fn settings() -> LayoutSettings {
        LayoutSettings::default()
    }

    /// Complete tree with `levels` levels, ids in heap order
    fn complete_tree(levels: u32) -> TreeValue {
        let n = 2usize.pow(levels) - 1;
        let values: Vec<TraceValue> = (0..n as i64).map(TraceValue::int).collect();
        TreeValue::from_heap_array(&values)
    }

    /// Left spine of `n` nodes
    fn left_spine(n: usize) -> TreeValue {
        let nodes = (0..n)
            .map(|i| {
                let left = (i + 1 < n).then(|| format!("n{}", i + 1));
                TreeNode::new(format!("n{}", i), TraceValue::int(i as i64))
                    .with_children(left.as_deref(), None)
            })
            .collect();
        TreeValue::new(nodes, Some("n0".into()))
    }

    #[test]
    fn test_empty_tree() {
        let layout = layout_tree(&TreeValue::default(), &settings(), 40);
        assert!(layout.nodes.is_empty());
        assert!(layout.edges.is_empty());
        assert_eq!(layout.width, settings().slot_width());
        assert_eq!(layout.overflow, 0);
    }

    #[test]
    fn test_single_node() {
        let tree = TreeValue::new(vec![TreeNode::new("a", TraceValue::int(1))], Some("a".into()));
        let layout = layout_tree(&tree, &settings(), 40);
        assert_eq!(layout.nodes.len(), 1);
        assert_eq!(layout.position("a").unwrap().x, 0.5 * settings().slot_width());
    }

    #[test]
    fn test_skewed_tree_narrower_than_balanced() {
        let skewed = layout_tree(&left_spine(13), &settings(), 40);
        let balanced = layout_tree(&complete_tree(4), &settings(), 40);
        assert_eq!(skewed.nodes.len(), 13);
        assert_eq!(balanced.nodes.len(), 15);
        assert!(skewed.width < balanced.width);
        assert_eq!(skewed.width, 7.0 * settings().slot_width());
        assert_eq!(balanced.width, 8.0 * settings().slot_width());
    }

    #[test]
    fn test_parent_above_children() {
        let layout = layout_tree(&complete_tree(2), &settings(), 40);
        let root = layout.position("0").unwrap();
        let left = layout.position("1").unwrap();
        let right = layout.position("2").unwrap();
        assert!(left.x < root.x && root.x < right.x);
        assert!(root.y < left.y);
        assert_eq!(left.y, right.y);
        assert_eq!(layout.edges.len(), 2);
        assert_eq!(layout.edges[0].id, "0--1");
    }

    #[test]
    fn test_cap_keeps_levels_nearest_root() {
        let layout = layout_tree(&complete_tree(4), &settings(), 7);
        assert_eq!(layout.nodes.len(), 7);
        assert_eq!(layout.overflow, 8);
        let ids: Vec<&str> = layout.node_ids().collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5", "6"]);
        // No edge may reference a dropped node
        assert!(layout.edges.iter().all(|e| layout.node(&e.to).is_some()));
    }

    #[test]
    fn test_shared_and_dangling_children() {
        let nodes = vec![
            TreeNode::new("a", TraceValue::int(1)).with_children(Some("b"), Some("b")),
            TreeNode::new("b", TraceValue::int(2)).with_children(Some("a"), Some("zz")),
        ];
        let layout = layout_tree(&TreeValue::new(nodes, Some("a".into())), &settings(), 40);
        assert_eq!(layout.nodes.len(), 2);
        assert_eq!(layout.edges.len(), 1);
    }

    #[test]
    fn test_same_level_nodes_do_not_overlap() {
        // Zig-zag subtree next to a full subtree
        let nodes = vec![
            TreeNode::new("r", TraceValue::int(0)).with_children(Some("a"), Some("b")),
            TreeNode::new("a", TraceValue::int(1)).with_children(None, Some("c")),
            TreeNode::new("c", TraceValue::int(2)).with_children(Some("d"), None),
            TreeNode::new("b", TraceValue::int(3)).with_children(Some("e"), Some("f")),
            TreeNode::new("d", TraceValue::int(4)),
            TreeNode::new("e", TraceValue::int(5)),
            TreeNode::new("f", TraceValue::int(6)),
        ];
        let layout = layout_tree(&TreeValue::new(nodes, Some("r".into())), &settings(), 40);
        let unit = settings().slot_width();
        for a in &layout.nodes {
            for b in &layout.nodes {
                if a.id != b.id && a.position.y == b.position.y {
                    assert!((a.position.x - b.position.x).abs() >= unit - 1e-9);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn test_layout_is_deterministic_and_preserves_ids(
            values in prop::collection::vec(prop::option::of(0i64..100), 1..60)
        ) {
            let mut values: Vec<TraceValue> = values
                .into_iter()
                .map(|v| v.map(TraceValue::int).unwrap_or(TraceValue::Null))
                .collect();
            values[0] = TraceValue::int(0);
            let tree = TreeValue::from_level_order(&values);

            let first = layout_tree(&tree, &settings(), 1000);
            let second = layout_tree(&tree, &settings(), 1000);
            prop_assert_eq!(&first, &second);

            let mut laid_out: Vec<&str> = first.node_ids().collect();
            let mut input: Vec<&str> = tree.nodes().iter().map(|n| n.id.as_str()).collect();
            laid_out.sort_unstable();
            input.sort_unstable();
            prop_assert_eq!(laid_out, input);
            prop_assert!(first.width <= tree.len() as f64 * settings().slot_width());
        }
    }
}
