//! Layouts for the linear and tabular kinds.
//!
//! | Kind                          | Node ids        | Arrangement              |
//! |-------------------------------|-----------------|--------------------------|
//! | array, set, stack, queue, ... | `0`, `1`, ...   | one row of cells         |
//! | linked list                   | `0`, `1`, ...   | one row, chained edges   |
//! | several linked lists          | `L0:0`, `L1:0`  | one row per list         |
//! | matrix                        | `r,c`           | grid, row-major          |
//! | dictionary                    | the keys        | one row per key          |
//!
//! All of them honor the node cap by dropping nodes from the end.

use super::{Layout, LayoutEdge, LayoutNode};
use crate::config::LayoutSettings;
use crate::trace::ListValue;

/// Id of node `index` in list `list` of a list group
pub fn list_group_node_id(list: usize, index: usize) -> String {
    format!("L{}:{}", list, index)
}

/// Id of a matrix cell
pub fn matrix_cell_id(row: usize, col: usize) -> String {
    format!("{},{}", row, col)
}

fn row_width(cells: usize, settings: &LayoutSettings) -> f64 {
    cells.max(1) as f64 * settings.slot_width()
}

/// Horizontal strip of `len` cells
pub fn layout_sequence(len: usize, settings: &LayoutSettings, max_nodes: usize) -> Layout {
    let shown = len.min(max_nodes);
    let unit = settings.slot_width();
    let y = settings.node_size / 2.0;

    Layout {
        nodes: (0..shown)
            .map(|i| LayoutNode::new(i.to_string(), (i as f64 + 0.5) * unit, y))
            .collect(),
        edges: Vec::new(),
        width: row_width(shown, settings),
        height: settings.node_size,
        overflow: len - shown,
    }
}

/// Chain of list nodes with `next` edges, `prev` edges for doubly linked
/// lists and a back edge from the tail to the cycle entry
pub fn layout_linked_list(list: &ListValue, settings: &LayoutSettings, max_nodes: usize) -> Layout {
    let mut layout = layout_sequence(list.len(), settings, max_nodes);
    let ids: Vec<String> = layout.nodes.iter().map(|n| n.id.clone()).collect();
    layout.edges = chain_edges(&ids, list);

    // Room below the row for the cycle edge to curve back
    if list.cycle_index.is_some() {
        layout.height += settings.level_spacing / 2.0;
    }
    layout
}

fn chain_edges(ids: &[String], list: &ListValue) -> Vec<LayoutEdge> {
    let mut edges = Vec::new();
    for pair in ids.windows(2) {
        edges.push(LayoutEdge::between(&pair[0], &pair[1], true));
        if list.is_doubly {
            edges.push(LayoutEdge::between(&pair[1], &pair[0], true));
        }
    }
    // Only drawn when the whole list fits, otherwise the tail is not shown
    if let (Some(target), true) = (list.cycle_index, ids.len() == list.len()) {
        if let (Some(last), Some(entry)) = (ids.last(), ids.get(target)) {
            edges.push(LayoutEdge::between(last, entry, true));
        }
    }
    edges
}

/// Several linked lists, one per row. The node cap applies to the group as a
/// whole, filling rows in order.
pub fn layout_list_group(
    lists: &[&ListValue],
    settings: &LayoutSettings,
    max_nodes: usize,
) -> Layout {
    if lists.is_empty() {
        return Layout::empty(settings);
    }

    let unit = settings.slot_width();
    let half = settings.node_size / 2.0;
    let mut remaining = max_nodes;
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut widest = 0;
    let mut overflow = 0;

    for (li, list) in lists.iter().enumerate() {
        let shown = list.len().min(remaining);
        remaining -= shown;
        overflow += list.len() - shown;
        widest = widest.max(shown);

        let ids: Vec<String> = (0..shown).map(|i| list_group_node_id(li, i)).collect();
        let y = half + li as f64 * settings.level_spacing;
        for (i, id) in ids.iter().enumerate() {
            nodes.push(LayoutNode::new(id.clone(), (i as f64 + 0.5) * unit, y));
        }
        edges.extend(chain_edges(&ids, list));
    }

    Layout {
        nodes,
        edges,
        width: row_width(widest, settings),
        height: settings.node_size + (lists.len() - 1) as f64 * settings.level_spacing,
        overflow,
    }
}

/// Grid of cells, one entry of `row_lengths` per row. Empty rows still take
/// up their slot so later rows keep their row index.
pub fn layout_matrix(row_lengths: &[usize], settings: &LayoutSettings, max_nodes: usize) -> Layout {
    let unit = settings.slot_width();
    let total: usize = row_lengths.iter().sum();
    let mut nodes = Vec::with_capacity(total.min(max_nodes));
    let mut rows_spanned = 0;
    let mut widest = 0;

    'rows: for (r, &len) in row_lengths.iter().enumerate() {
        for c in 0..len {
            if nodes.len() == max_nodes {
                break 'rows;
            }
            rows_spanned = r + 1;
            widest = widest.max(c + 1);
            nodes.push(LayoutNode::new(
                matrix_cell_id(r, c),
                (c as f64 + 0.5) * unit,
                (r as f64 + 0.5) * unit,
            ));
        }
    }

    let overflow = total - nodes.len();
    if overflow > 0 {
        tracing::debug!("Matrix layout truncated: {} cells over the cap", overflow);
    }

    Layout {
        width: row_width(widest, settings),
        height: rows_spanned.max(1) as f64 * unit,
        nodes,
        edges: Vec::new(),
        overflow,
    }
}

/// One row per key, keys in the given order
pub fn layout_dictionary(keys: &[&str], settings: &LayoutSettings, max_nodes: usize) -> Layout {
    let shown = keys.len().min(max_nodes);
    let unit = settings.slot_width();
    let x = settings.node_size / 2.0;

    Layout {
        nodes: keys[..shown]
            .iter()
            .enumerate()
            .map(|(i, key)| LayoutNode::new(*key, x, (i as f64 + 0.5) * unit))
            .collect(),
        edges: Vec::new(),
        // Key column plus value column
        width: 2.0 * unit,
        height: shown.max(1) as f64 * unit,
        overflow: keys.len() - shown,
    }
}
