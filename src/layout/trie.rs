//! N-ary trie layout.
//!
//! Each node owns a horizontal interval sized by its rendered subtree: a leaf
//! is one node wide, an internal node is the sum of its children plus a
//! sibling gap between each pair (and never narrower than a node). A node is
//! centered over its interval, levels are `level_spacing` apart.

use std::collections::{HashSet, VecDeque};

use super::{Layout, LayoutEdge, LayoutNode};
use crate::config::LayoutSettings;
use crate::trace::TrieValue;

struct Slot<'a> {
    id: &'a str,
    depth: usize,
    children: Vec<usize>,
}

/// Lay out a trie, rendering at most `max_nodes` nodes
pub fn layout_trie(trie: &TrieValue, settings: &LayoutSettings, max_nodes: usize) -> Layout {
    let Some(root_id) = trie.root_id().filter(|id| trie.contains(id)) else {
        return Layout::empty(settings);
    };

    let mut slots: Vec<Slot<'_>> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::from([root_id]);
    let mut queue: VecDeque<(&str, usize, Option<usize>)> = VecDeque::from([(root_id, 0, None)]);
    let mut overflow = 0;

    while let Some((id, depth, parent)) = queue.pop_front() {
        let Some(node) = trie.node(id) else {
            continue;
        };

        let this_slot = (slots.len() < max_nodes).then_some(slots.len());
        match this_slot {
            Some(index) => {
                slots.push(Slot {
                    id: node.id.as_str(),
                    depth,
                    children: Vec::new(),
                });
                if let Some(p) = parent {
                    slots[p].children.push(index);
                }
            }
            None => overflow += 1,
        }

        for child in &node.children {
            if trie.contains(child) && visited.insert(child.as_str()) {
                queue.push_back((child.as_str(), depth + 1, this_slot));
            }
        }
    }

    if overflow > 0 {
        tracing::debug!("Trie layout truncated: {} nodes over the cap", overflow);
    }
    if slots.is_empty() {
        return Layout {
            overflow,
            ..Layout::empty(settings)
        };
    }

    let node_size = settings.node_size;
    let gap = settings.sibling_gap;

    let mut width = vec![0.0f64; slots.len()];
    for i in (0..slots.len()).rev() {
        let children = &slots[i].children;
        width[i] = if children.is_empty() {
            node_size
        } else {
            let sum: f64 = children.iter().map(|&c| width[c]).sum();
            (sum + (children.len() - 1) as f64 * gap).max(node_size)
        };
    }

    let mut start = vec![0.0f64; slots.len()];
    for i in 0..slots.len() {
        let children = &slots[i].children;
        if children.is_empty() {
            continue;
        }
        let used: f64 =
            children.iter().map(|&c| width[c]).sum::<f64>() + (children.len() - 1) as f64 * gap;
        // Children narrower than a lone node are centered in the parent interval
        let mut x = start[i] + (width[i] - used) / 2.0;
        for &c in children {
            start[c] = x;
            x += width[c] + gap;
        }
    }

    let half = node_size / 2.0;
    let max_depth = slots.iter().map(|s| s.depth).max().unwrap_or(0);

    let nodes = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            LayoutNode::new(
                slot.id,
                start[i] + width[i] / 2.0,
                half + slot.depth as f64 * settings.level_spacing,
            )
        })
        .collect();

    let mut edges = Vec::with_capacity(slots.len() - 1);
    for slot in &slots {
        for &child in &slot.children {
            edges.push(LayoutEdge::between(slot.id, slots[child].id, false));
        }
    }

    Layout {
        nodes,
        edges,
        width: width[0],
        height: node_size + max_depth as f64 * settings.level_spacing,
        overflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{trie_prefix_id, TrieNode};

    fn settings() -> LayoutSettings {
        LayoutSettings::default()
    }

    #[test]
    fn test_empty_trie() {
        let layout = layout_trie(&TrieValue::default(), &settings(), 40);
        assert!(layout.is_empty());
        assert_eq!(layout.overflow, 0);
    }

    #[test]
    fn test_root_only() {
        let trie = TrieValue::from_words(std::iter::empty());
        let layout = layout_trie(&trie, &settings(), 40);
        assert_eq!(layout.nodes.len(), 1);
        assert_eq!(layout.width, settings().node_size);
        assert_eq!(layout.nodes[0].position.x, settings().node_size / 2.0);
    }

    #[test]
    fn test_widths_sum_children_and_gaps() {
        let s = settings();
        let trie = TrieValue::from_words(["ab", "ac", "b"]);
        let layout = layout_trie(&trie, &s, 40);

        // Leaves: ab, ac, b. "a" spans two leaves plus one gap
        let a_width = 2.0 * s.node_size + s.sibling_gap;
        assert_eq!(layout.width, a_width + s.sibling_gap + s.node_size);

        let a = layout.position(&trie_prefix_id("a")).unwrap();
        let ab = layout.position(&trie_prefix_id("ab")).unwrap();
        let ac = layout.position(&trie_prefix_id("ac")).unwrap();
        assert_eq!(a.x, (ab.x + ac.x) / 2.0);
        assert_eq!(ab.y, s.node_size / 2.0 + 2.0 * s.level_spacing);
        assert_eq!(layout.edges.len(), 4);
    }

    #[test]
    fn test_cap_is_breadth_first() {
        let trie = TrieValue::from_words(["abc", "abd", "x"]);
        let layout = layout_trie(&trie, &settings(), 3);
        let ids: Vec<&str> = layout.node_ids().collect();
        assert_eq!(ids, vec!["^", "^a", "^x"]);
        assert_eq!(layout.overflow, 3);
        assert!(layout.edges.iter().all(|e| layout.node(&e.to).is_some()));
    }

    #[test]
    fn test_cyclic_children_terminate() {
        let nodes = vec![
            TrieNode {
                id: "r".into(),
                character: None,
                is_end: false,
                children: vec!["a".into()],
            },
            TrieNode {
                id: "a".into(),
                character: Some('a'),
                is_end: true,
                children: vec!["r".into(), "a".into(), "missing".into()],
            },
        ];
        let layout = layout_trie(&TrieValue::new(nodes, Some("r".into())), &settings(), 40);
        assert_eq!(layout.nodes.len(), 2);
        assert_eq!(layout.edges.len(), 1);
    }

    #[test]
    fn test_repeatable() {
        let trie = TrieValue::from_words(["tea", "ten", "to", "inn"]);
        assert_eq!(
            layout_trie(&trie, &settings(), 40),
            layout_trie(&trie, &settings(), 40)
        );
    }
}
