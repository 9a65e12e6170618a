//! Geometric layout of resolved structures.
//!
//! Every engine is a pure function from a structure to a [`Layout`]: node
//! positions, edges and the canvas size. Node ids in the output are always
//! the input structure's own ids (array index, tree node id, trie node id),
//! never freshly generated, so a renderer can animate between two layouts of
//! the same structure by id.
//!
//! # Engines
//!
//! - [`tree`] - binary trees (and heaps viewed as trees), subtree-width spacing
//! - [`graph`] - adjacency lists, circular or Fruchterman-Reingold
//! - [`trie`] - N-ary prefix trees, subtree-width spacing
//! - [`sequence`] - arrays, linked lists, matrices and dictionaries
//!
//! # Caching
//!
//! [`LayoutCache`] memoizes layouts by [`LayoutKey`]: the kind, the element
//! count and a [`fingerprint`], which hashes only the
//! shape of a structure. Value changes that leave the shape intact reuse the
//! cached layout.

pub mod cache;
pub mod graph;
pub mod sequence;
pub mod tree;
pub mod trie;

pub use cache::LayoutCache;
pub use graph::{GraphInput, GraphLayoutParams, Neighbor};

use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::config::{LayoutSettings, VisualizationConfig};
use crate::resolver::{ResolvedStructure, StructureKind};
use crate::trace::{TraceValue, TreeValue};

/// A point on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A positioned node. `id` is the input structure's node identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub id: String,
    #[serde(flatten)]
    pub position: Position,
}

impl LayoutNode {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            position: Position::new(x, y),
        }
    }
}

/// A connection between two layout nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub directed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl LayoutEdge {
    /// Edge whose id is derived from its endpoints
    pub fn between(from: &str, to: &str, directed: bool) -> Self {
        let id = if directed {
            format!("{}->{}", from, to)
        } else {
            format!("{}--{}", from, to)
        };
        Self {
            id,
            from: from.to_string(),
            to: to.to_string(),
            directed,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: Option<f64>) -> Self {
        self.weight = weight;
        self
    }
}

/// Output of a layout engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    pub width: f64,
    pub height: f64,
    /// Nodes left out because of the node cap
    #[serde(skip)]
    pub overflow: usize,
}

impl Layout {
    /// Layout with no nodes on the minimum canvas
    pub fn empty(settings: &LayoutSettings) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            width: settings.slot_width(),
            height: settings.node_size,
            overflow: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.node(id).map(|n| n.position)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }
}

/// Lay out a resolved structure with the engine matching its kind
pub fn compute_layout(resolved: &ResolvedStructure, config: &VisualizationConfig) -> Layout {
    let settings = &config.layout;
    let cap = config.max_visualization_nodes;

    match (resolved.kind, &resolved.value) {
        (StructureKind::Tree, TraceValue::Tree(t)) => tree::layout_tree(t, settings, cap),
        (StructureKind::Trie, TraceValue::Trie(t)) => trie::layout_trie(t, settings, cap),
        (StructureKind::Heap, TraceValue::Array(items)) => {
            tree::layout_tree(&TreeValue::from_heap_array(items), settings, cap)
        }
        (StructureKind::Graph, value) => match GraphInput::from_value(value) {
            Some(graph) => graph::layout_graph(&graph, &GraphLayoutParams::from_config(config)),
            None => Layout::empty(settings),
        },
        (StructureKind::LinkedList, TraceValue::List(list)) => {
            sequence::layout_linked_list(list, settings, cap)
        }
        (StructureKind::LinkedLists, TraceValue::Array(items)) => {
            let lists: Vec<_> = items
                .iter()
                .filter_map(|v| match v {
                    TraceValue::List(l) => Some(l),
                    _ => None,
                })
                .collect();
            sequence::layout_list_group(&lists, settings, cap)
        }
        (StructureKind::Matrix, TraceValue::Array(rows)) => {
            let lengths: Vec<usize> = rows
                .iter()
                .map(|r| r.as_array().map_or(0, <[TraceValue]>::len))
                .collect();
            sequence::layout_matrix(&lengths, settings, cap)
        }
        (StructureKind::Dictionary, TraceValue::Map(entries)) => {
            let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
            sequence::layout_dictionary(&keys, settings, cap)
        }
        (_, value) => match value.sequence_items() {
            Some(items) => sequence::layout_sequence(items.len(), settings, cap),
            None => Layout::empty(settings),
        },
    }
}

/// Hash of everything that determines a structure's layout: its kind and
/// shape (ids, links, lengths), but not node values.
pub fn fingerprint(resolved: &ResolvedStructure) -> u64 {
    let mut hasher = DefaultHasher::new();
    resolved.kind.hash(&mut hasher);
    hash_shape(&resolved.value, &mut hasher);
    hasher.finish()
}

/// Cache key for a layout. The kind and element count are compared exactly,
/// so two structures only share a layout if they also share a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutKey {
    pub kind: StructureKind,
    pub size: usize,
    pub fingerprint: u64,
}

impl LayoutKey {
    pub fn of(resolved: &ResolvedStructure) -> Self {
        Self {
            kind: resolved.kind,
            size: shape_size(&resolved.value),
            fingerprint: fingerprint(resolved),
        }
    }
}

/// Number of elements, cells or nodes in a structure
fn shape_size(value: &TraceValue) -> usize {
    match value {
        TraceValue::Array(items) => items
            .iter()
            .map(|item| match item {
                TraceValue::Array(row) => row.len() + 1,
                TraceValue::List(list) => list.len() + 1,
                _ => 1,
            })
            .sum(),
        TraceValue::Map(entries) => entries.len(),
        TraceValue::List(list) => list.len(),
        TraceValue::Tree(tree) => tree.len(),
        TraceValue::Trie(trie) => trie.len(),
        TraceValue::String(s) => s.chars().count(),
        TraceValue::Tagged { inner, .. } => shape_size(inner),
        TraceValue::Null
        | TraceValue::Bool(_)
        | TraceValue::Number { .. }
        | TraceValue::PointerRef(_) => 0,
    }
}

fn hash_shape(value: &TraceValue, hasher: &mut impl Hasher) {
    match value {
        TraceValue::Array(items) => {
            0u8.hash(hasher);
            items.len().hash(hasher);
            for item in items {
                match item {
                    TraceValue::Array(row) => {
                        row.len().hash(hasher);
                        // Adjacency rows: neighbor indices and weights shape the graph
                        for cell in row {
                            hash_scalar_bits(cell, hasher);
                        }
                    }
                    TraceValue::List(_) => hash_shape(item, hasher),
                    _ => {}
                }
            }
        }
        TraceValue::Map(entries) => {
            1u8.hash(hasher);
            for key in entries.keys() {
                key.hash(hasher);
            }
        }
        TraceValue::List(list) => {
            2u8.hash(hasher);
            list.len().hash(hasher);
            list.cycle_index.hash(hasher);
            list.is_doubly.hash(hasher);
        }
        TraceValue::Tree(tree) => {
            3u8.hash(hasher);
            tree.root_id().hash(hasher);
            for node in tree.nodes() {
                node.id.hash(hasher);
                node.left.hash(hasher);
                node.right.hash(hasher);
            }
        }
        TraceValue::Trie(trie) => {
            4u8.hash(hasher);
            trie.root_id().hash(hasher);
            for node in trie.nodes() {
                node.id.hash(hasher);
                node.children.hash(hasher);
            }
        }
        TraceValue::String(s) => {
            5u8.hash(hasher);
            s.chars().count().hash(hasher);
        }
        TraceValue::Tagged { inner, .. } => hash_shape(inner, hasher),
        TraceValue::Null
        | TraceValue::Bool(_)
        | TraceValue::Number { .. }
        | TraceValue::PointerRef(_) => 6u8.hash(hasher),
    }
}

fn hash_scalar_bits(value: &TraceValue, hasher: &mut impl Hasher) {
    match value {
        TraceValue::Number { value, .. } => value.to_bits().hash(hasher),
        TraceValue::Array(pair) => {
            for v in pair {
                hash_scalar_bits(v, hasher);
            }
        }
        _ => 0u8.hash(hasher),
    }
}
