//! Structural diffs between consecutive snapshots.
//!
//! Every function takes the previous value as an `Option`: with no previous
//! snapshot (the first step, or a variable that just appeared) there is
//! nothing to compare against and the diff is empty.
//!
//! Sequences are diffed two ways:
//!
//! - [`changed_indices`] compares position by position, which is what a
//!   renderer wants for in-place updates such as `nums[i] = x`.
//! - [`element_changes`] aligns the sequences with a longest common
//!   subsequence first, so an insertion or removal does not mark every later
//!   element as changed.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::trace::{TraceValue, TreeValue, TrieValue};

/// Classification of one element after alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Unchanged,
}

/// Result of an aligned sequence diff
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceDiff {
    /// One entry per current element
    pub changes: Vec<ChangeType>,
    /// Previous indices with no counterpart in the current sequence
    pub removed: Vec<usize>,
}

impl SequenceDiff {
    fn unchanged(len: usize) -> Self {
        Self {
            changes: vec![ChangeType::Unchanged; len],
            removed: Vec::new(),
        }
    }

    /// True when nothing was added, removed or modified
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.changes.iter().all(|c| *c == ChangeType::Unchanged)
    }
}

/// Current positions whose element differs from the previous element at the
/// same position, including positions past the previous end
pub fn changed_indices<T: PartialEq>(prev: Option<&[T]>, cur: &[T]) -> Vec<usize> {
    let Some(prev) = prev else {
        return Vec::new();
    };
    cur.iter()
        .enumerate()
        .filter(|(i, v)| prev.get(*i) != Some(*v))
        .map(|(i, _)| i)
        .collect()
}

/// LCS-aligned classification of every current element.
///
/// Between two consecutive matched elements, unmatched previous and current
/// elements are paired in order as `Modified`; any left-over current elements
/// are `Added` and left-over previous elements are reported in `removed`.
pub fn element_changes<T: PartialEq>(prev: Option<&[T]>, cur: &[T]) -> SequenceDiff {
    let Some(prev) = prev else {
        return SequenceDiff::unchanged(cur.len());
    };

    let (n, m) = (prev.len(), cur.len());
    // suffix[i][j] = LCS length of prev[i..] and cur[j..]
    let width = m + 1;
    let mut suffix = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            suffix[i * width + j] = if prev[i] == cur[j] {
                suffix[(i + 1) * width + j + 1] + 1
            } else {
                suffix[(i + 1) * width + j].max(suffix[i * width + j + 1])
            };
        }
    }

    let mut diff = SequenceDiff {
        changes: vec![ChangeType::Added; m],
        removed: Vec::new(),
    };
    let mut gap_prev: Vec<usize> = Vec::new();
    let mut gap_cur: Vec<usize> = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < n || j < m {
        if i < n && j < m && prev[i] == cur[j] {
            close_gap(&mut diff, &mut gap_prev, &mut gap_cur);
            diff.changes[j] = ChangeType::Unchanged;
            i += 1;
            j += 1;
        } else if j == m || (i < n && suffix[(i + 1) * width + j] >= suffix[i * width + j + 1]) {
            gap_prev.push(i);
            i += 1;
        } else {
            gap_cur.push(j);
            j += 1;
        }
    }
    close_gap(&mut diff, &mut gap_prev, &mut gap_cur);

    diff
}

fn close_gap(diff: &mut SequenceDiff, gap_prev: &mut Vec<usize>, gap_cur: &mut Vec<usize>) {
    let paired = gap_prev.len().min(gap_cur.len());
    for &j in &gap_cur[..paired] {
        diff.changes[j] = ChangeType::Modified;
    }
    // Remaining current entries keep their Added default
    diff.removed.extend_from_slice(&gap_prev[paired..]);
    gap_prev.clear();
    gap_cur.clear();
}

/// [`element_changes`] for sequences up to `cap` long; longer ones are
/// classified by position to bound the quadratic alignment cost
pub fn element_changes_capped<T: PartialEq>(
    prev: Option<&[T]>,
    cur: &[T],
    cap: usize,
) -> SequenceDiff {
    match prev {
        Some(p) if p.len() > cap || cur.len() > cap => {
            tracing::debug!(
                "Sequence diff over cap ({} -> {} elements), aligning by index",
                p.len(),
                cur.len()
            );
            index_aligned_changes(p, cur)
        }
        _ => element_changes(prev, cur),
    }
}

fn index_aligned_changes<T: PartialEq>(prev: &[T], cur: &[T]) -> SequenceDiff {
    SequenceDiff {
        changes: cur
            .iter()
            .enumerate()
            .map(|(i, v)| match prev.get(i) {
                Some(p) if p == v => ChangeType::Unchanged,
                Some(_) => ChangeType::Modified,
                None => ChangeType::Added,
            })
            .collect(),
        removed: (cur.len()..prev.len()).collect(),
    }
}

/// Ids of tree nodes that are new or whose value changed, in arena order
pub fn changed_tree_node_ids(prev: Option<&TreeValue>, cur: &TreeValue) -> Vec<String> {
    let Some(prev) = prev else {
        return Vec::new();
    };
    cur.nodes()
        .iter()
        .filter(|node| prev.node(&node.id).map_or(true, |p| p.value != node.value))
        .map(|node| node.id.clone())
        .collect()
}

/// Ids of trie nodes that are new or whose end-of-word flag changed
pub fn changed_trie_node_ids(prev: Option<&TrieValue>, cur: &TrieValue) -> Vec<String> {
    let Some(prev) = prev else {
        return Vec::new();
    };
    cur.nodes()
        .iter()
        .filter(|node| {
            prev.node(&node.id)
                .map_or(true, |p| p.is_end != node.is_end || p.character != node.character)
        })
        .map(|node| node.id.clone())
        .collect()
}

/// `(row, col)` of cells that are new or differ from the previous matrix
pub fn changed_matrix_cells(
    prev: Option<&[TraceValue]>,
    cur: &[TraceValue],
) -> Vec<(usize, usize)> {
    let Some(prev) = prev else {
        return Vec::new();
    };
    let mut cells = Vec::new();
    for (r, row) in cur.iter().enumerate() {
        let Some(row) = row.as_array() else {
            continue;
        };
        let prev_row = prev.get(r).and_then(TraceValue::as_array);
        for (c, cell) in row.iter().enumerate() {
            if prev_row.and_then(|p| p.get(c)) != Some(cell) {
                cells.push((r, c));
            }
        }
    }
    cells
}

/// Keys that are new or whose value changed
pub fn changed_keys(
    prev: Option<&BTreeMap<String, TraceValue>>,
    cur: &BTreeMap<String, TraceValue>,
) -> Vec<String> {
    let Some(prev) = prev else {
        return Vec::new();
    };
    cur.iter()
        .filter(|(k, v)| prev.get(*k) != Some(*v))
        .map(|(k, _)| k.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TreeNode;
    use proptest::prelude::*;
    use ChangeType::*;

    #[test]
    fn test_no_previous_is_empty() {
        assert!(changed_indices::<i32>(None, &[1, 2]).is_empty());
        let diff = element_changes::<i32>(None, &[1, 2]);
        assert_eq!(diff.changes, vec![Unchanged, Unchanged]);
        assert!(diff.is_clean());
        assert!(changed_keys(None, &BTreeMap::new()).is_empty());
        assert!(changed_matrix_cells(None, &[]).is_empty());
    }

    #[test]
    fn test_changed_indices_by_position() {
        assert_eq!(changed_indices(Some(&[1, 2, 3][..]), &[1, 5, 3, 4]), vec![1, 3]);
        assert!(changed_indices(Some(&[1, 2, 3][..]), &[1, 2]).is_empty());
    }

    #[test]
    fn test_lcs_removal() {
        let diff = element_changes(Some(&[1, 2, 3][..]), &[1, 3]);
        assert_eq!(diff.changes, vec![Unchanged, Unchanged]);
        assert_eq!(diff.removed, vec![1]);
    }

    #[test]
    fn test_lcs_insertion() {
        let diff = element_changes(Some(&[1, 3][..]), &[1, 2, 3]);
        assert_eq!(diff.changes, vec![Unchanged, Added, Unchanged]);
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn test_lcs_replacement_is_modified() {
        let diff = element_changes(Some(&[1, 2, 3][..]), &[1, 9, 3]);
        assert_eq!(diff.changes, vec![Unchanged, Modified, Unchanged]);
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn test_lcs_uneven_gap() {
        let diff = element_changes(Some(&[0, 1, 2, 9][..]), &[0, 7, 9, 8]);
        assert_eq!(diff.changes, vec![Unchanged, Modified, Unchanged, Added]);
        assert_eq!(diff.removed, vec![2]);
    }

    #[test]
    fn test_capped_falls_back_to_positions() {
        let prev = [1, 2, 3, 4];
        let diff = element_changes_capped(Some(&prev[..]), &[2, 3], 3);
        assert_eq!(diff.changes, vec![Modified, Modified]);
        assert_eq!(diff.removed, vec![2, 3]);

        let aligned = element_changes_capped(Some(&prev[..]), &[2, 3], 10);
        assert_eq!(aligned.changes, vec![Unchanged, Unchanged]);
        assert_eq!(aligned.removed, vec![0, 3]);
    }

    #[test]
    fn test_tree_node_ids() {
        let prev = TreeValue::new(
            vec![
                TreeNode::new("a", TraceValue::int(1)).with_children(Some("b"), None),
                TreeNode::new("b", TraceValue::int(2)),
            ],
            Some("a".into()),
        );
        let cur = TreeValue::new(
            vec![
                TreeNode::new("a", TraceValue::int(1)).with_children(Some("b"), Some("c")),
                TreeNode::new("b", TraceValue::int(5)),
                TreeNode::new("c", TraceValue::int(3)),
            ],
            Some("a".into()),
        );
        assert_eq!(changed_tree_node_ids(Some(&prev), &cur), vec!["b", "c"]);
        assert!(changed_tree_node_ids(None, &cur).is_empty());
    }

    #[test]
    fn test_trie_node_ids() {
        let prev = TrieValue::from_words(["to"]);
        let cur = TrieValue::from_words(["to", "t", "tea"]);
        let changed = changed_trie_node_ids(Some(&prev), &cur);
        assert_eq!(changed, vec!["^t", "^te", "^tea"]);
    }

    #[test]
    fn test_matrix_cells() {
        let prev = [TraceValue::ints([0, 0]), TraceValue::ints([0, 0])];
        let cur = [TraceValue::ints([0, 1]), TraceValue::ints([0, 0, 1])];
        assert_eq!(changed_matrix_cells(Some(&prev[..]), &cur), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_keys() {
        let prev = BTreeMap::from([("2".to_string(), TraceValue::int(0))]);
        let cur = BTreeMap::from([
            ("2".to_string(), TraceValue::int(0)),
            ("7".to_string(), TraceValue::int(1)),
        ]);
        assert_eq!(changed_keys(Some(&prev), &cur), vec!["7"]);
    }

    proptest! {
        #[test]
        fn test_self_diff_is_clean(v in prop::collection::vec(0u8..5, 0..40)) {
            prop_assert!(element_changes(Some(&v[..]), &v).is_clean());
            prop_assert!(changed_indices(Some(&v[..]), &v).is_empty());
        }

        #[test]
        fn test_diff_accounts_for_every_element(
            prev in prop::collection::vec(0u8..4, 0..30),
            cur in prop::collection::vec(0u8..4, 0..30),
        ) {
            let diff = element_changes(Some(&prev[..]), &cur);
            prop_assert_eq!(diff.changes.len(), cur.len());
            let kept = diff.changes.iter().filter(|c| **c != Added).count();
            // Every previous element is matched, modified or removed
            prop_assert_eq!(kept + diff.removed.len(), prev.len());
        }
    }
}
