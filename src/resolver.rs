//! Structure kind resolution
//!
//! Decides which renderable shape a variable holds. Explicit `__type` tags
//! always win; otherwise a fixed list of shape and naming rules is applied to
//! the variable's value. Resolution is a pure function of the variable name
//! and its snapshots, so resolving the same inputs twice gives the same
//! answer.
//!
//! # Rule precedence
//!
//! 1. Explicit tag on any snapshot (current, then input, then output)
//! 2. Native list / tree / trie values, arrays of lists, maps, strings
//! 3. Arrays:
//!    - equal-length rows of only 0/1 → matrix (bitmasks and DP tables are
//!      never graphs)
//!    - ragged rows of valid row indices → adjacency-list graph
//!    - heap/stack/queue/set variable names → that sequence kind
//!    - any other array of arrays → matrix
//!    - everything else → array
//! 4. Scalars → no structure

use serde::Serialize;

use crate::layout::graph::GraphInput;
use crate::trace::{ListValue, TagKind, TraceValue, TreeValue};

/// The closed set of renderable shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StructureKind {
    Array,
    Matrix,
    Graph,
    Dictionary,
    Set,
    Stack,
    Queue,
    Heap,
    String,
    LinkedList,
    LinkedLists,
    Tree,
    Trie,
}

impl StructureKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            StructureKind::Array => "Array",
            StructureKind::Matrix => "Matrix",
            StructureKind::Graph => "Graph",
            StructureKind::Dictionary => "Dictionary",
            StructureKind::Set => "Set",
            StructureKind::Stack => "Stack",
            StructureKind::Queue => "Queue",
            StructureKind::Heap => "Heap",
            StructureKind::String => "String",
            StructureKind::LinkedList => "Linked List",
            StructureKind::LinkedLists => "Linked Lists",
            StructureKind::Tree => "Tree",
            StructureKind::Trie => "Trie",
        }
    }

    /// How strongly a variable of this kind deserves to be the focus of a
    /// frame. Higher wins.
    pub fn focus_priority(&self) -> u8 {
        match self {
            StructureKind::Tree
            | StructureKind::Trie
            | StructureKind::Graph
            | StructureKind::LinkedList
            | StructureKind::LinkedLists => 4,
            StructureKind::Matrix | StructureKind::Heap => 3,
            StructureKind::Array
            | StructureKind::Stack
            | StructureKind::Queue
            | StructureKind::Set => 2,
            StructureKind::Dictionary => 1,
            StructureKind::String => 0,
        }
    }

    /// Kinds whose elements are addressed by a single integer index
    pub fn is_indexed(&self) -> bool {
        matches!(
            self,
            StructureKind::Array
                | StructureKind::Set
                | StructureKind::Stack
                | StructureKind::Queue
                | StructureKind::Heap
                | StructureKind::String
                | StructureKind::LinkedList
                | StructureKind::Matrix
                | StructureKind::Graph
        )
    }
}

impl std::fmt::Display for StructureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A classified value with any tag wrapper removed and the payload
/// normalized to its kind (e.g. a tagged array becomes a [`ListValue`]).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStructure {
    pub kind: StructureKind,
    pub value: TraceValue,
}

impl ResolvedStructure {
    fn new(kind: StructureKind, value: TraceValue) -> Self {
        Self { kind, value }
    }
}

/// The values of one variable at the input, selected and output steps
#[derive(Debug, Clone, Copy, Default)]
pub struct Snapshots<'a> {
    pub input: Option<&'a TraceValue>,
    pub current: Option<&'a TraceValue>,
    pub output: Option<&'a TraceValue>,
}

impl<'a> Snapshots<'a> {
    pub fn current(value: &'a TraceValue) -> Self {
        Self {
            current: Some(value),
            ..Default::default()
        }
    }

    /// Present snapshots in precedence order
    fn ordered(&self) -> impl Iterator<Item = &'a TraceValue> {
        [self.current, self.input, self.output].into_iter().flatten()
    }
}

/// Resolve a single value
pub fn resolve_value(name: &str, value: &TraceValue) -> Option<ResolvedStructure> {
    resolve(name, Snapshots::current(value))
}

/// Classify the variable `name`. Returns `None` when no rule matches; callers
/// fall back to a flat key/value display.
pub fn resolve(name: &str, snapshots: Snapshots<'_>) -> Option<ResolvedStructure> {
    let primary = snapshots.ordered().next()?;
    let (_, value) = primary.untagged();

    if let Some(tag) = snapshots.ordered().find_map(|v| v.untagged().0) {
        if let Some(resolved) = resolve_tagged(tag, value) {
            tracing::trace!(name, kind = ?resolved.kind, "Resolved from explicit tag");
            return Some(resolved);
        }
    }

    let resolved = match value {
        TraceValue::List(_) => {
            Some(ResolvedStructure::new(StructureKind::LinkedList, value.clone()))
        }
        TraceValue::Tree(_) => Some(ResolvedStructure::new(StructureKind::Tree, value.clone())),
        TraceValue::Trie(_) => Some(ResolvedStructure::new(StructureKind::Trie, value.clone())),
        TraceValue::Map(_) => {
            Some(ResolvedStructure::new(StructureKind::Dictionary, value.clone()))
        }
        TraceValue::String(s) if !s.is_empty() => {
            Some(ResolvedStructure::new(StructureKind::String, value.clone()))
        }
        TraceValue::Array(items) => Some(ResolvedStructure::new(
            classify_array(name, items, &snapshots),
            value.clone(),
        )),
        TraceValue::Null
        | TraceValue::Bool(_)
        | TraceValue::Number { .. }
        | TraceValue::String(_)
        | TraceValue::PointerRef(_)
        | TraceValue::Tagged { .. } => None,
    };

    tracing::trace!(name, kind = ?resolved.as_ref().map(|r| r.kind), "Resolved from shape");
    resolved
}

fn resolve_tagged(tag: TagKind, value: &TraceValue) -> Option<ResolvedStructure> {
    match (tag, value) {
        (TagKind::List, TraceValue::List(_)) => {
            Some(ResolvedStructure::new(StructureKind::LinkedList, value.clone()))
        }
        (TagKind::List, TraceValue::Array(items)) => Some(ResolvedStructure::new(
            StructureKind::LinkedList,
            TraceValue::List(ListValue::from_values(items.iter().cloned())),
        )),
        (TagKind::Tree, TraceValue::Tree(_)) => {
            Some(ResolvedStructure::new(StructureKind::Tree, value.clone()))
        }
        (TagKind::Tree, TraceValue::Array(items)) => Some(ResolvedStructure::new(
            StructureKind::Tree,
            TraceValue::Tree(TreeValue::from_level_order(items)),
        )),
        (TagKind::Set, TraceValue::Array(_)) => {
            Some(ResolvedStructure::new(StructureKind::Set, value.clone()))
        }
        (TagKind::Stack, TraceValue::Array(_)) => {
            Some(ResolvedStructure::new(StructureKind::Stack, value.clone()))
        }
        (TagKind::Queue, TraceValue::Array(_)) => {
            Some(ResolvedStructure::new(StructureKind::Queue, value.clone()))
        }
        (TagKind::Heap, TraceValue::Array(_)) => {
            Some(ResolvedStructure::new(StructureKind::Heap, value.clone()))
        }
        _ => None,
    }
}

fn classify_array(name: &str, items: &[TraceValue], snapshots: &Snapshots<'_>) -> StructureKind {
    if !items.is_empty() && items.iter().all(|v| matches!(v, TraceValue::List(_))) {
        return StructureKind::LinkedLists;
    }

    let rows: Option<Vec<&[TraceValue]>> = if items.is_empty() {
        None
    } else {
        items.iter().map(TraceValue::as_array).collect()
    };
    let tokens = name_tokens(name);

    if let Some(rows) = &rows {
        let uniform = rows.windows(2).all(|w| w[0].len() == w[1].len());
        if uniform && rows.iter().flat_map(|r| r.iter()).all(is_bit) {
            return StructureKind::Matrix;
        }

        let graph_named = tokens.iter().any(|t| GRAPH_NAMES.contains(&t.as_str()));
        if (!uniform || graph_named) && all_snapshots_are_graphs(snapshots) {
            return StructureKind::Graph;
        }
    }

    if let Some(kind) = kind_from_name(&tokens) {
        return kind;
    }

    if rows.is_some() {
        StructureKind::Matrix
    } else {
        StructureKind::Array
    }
}

fn is_bit(value: &TraceValue) -> bool {
    matches!(value.as_integer(), Some(0) | Some(1))
}

fn all_snapshots_are_graphs(snapshots: &Snapshots<'_>) -> bool {
    snapshots
        .ordered()
        .map(|v| v.untagged().1)
        .filter(|v| matches!(v, TraceValue::Array(_)))
        .all(|v| GraphInput::from_value(v).is_some())
}

const HEAP_NAMES: &[&str] = &["heap", "minheap", "maxheap", "pq", "priority"];
const STACK_NAMES: &[&str] = &["stack", "stk", "st"];
const QUEUE_NAMES: &[&str] = &["queue", "q", "dq", "deque"];
const SET_NAMES: &[&str] = &["set", "seen", "visited"];
const GRAPH_NAMES: &[&str] = &["graph", "adj", "adjacency", "neighbors", "g"];

fn kind_from_name(tokens: &[String]) -> Option<StructureKind> {
    let has = |names: &[&str]| tokens.iter().any(|t| names.contains(&t.as_str()));
    if has(HEAP_NAMES) {
        Some(StructureKind::Heap)
    } else if has(STACK_NAMES) {
        Some(StructureKind::Stack)
    } else if has(QUEUE_NAMES) {
        Some(StructureKind::Queue)
    } else if has(SET_NAMES) {
        Some(StructureKind::Set)
    } else {
        None
    }
}

/// Split a variable name into lowercase words on `_`, `-`, digits and
/// camelCase boundaries (`minHeap` → `min`, `heap`).
pub(crate) fn name_tokens(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in name.chars() {
        if !c.is_alphabetic() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn rows(rows: &[&[i64]]) -> TraceValue {
        TraceValue::array(rows.iter().map(|r| TraceValue::ints(r.iter().copied())))
    }

    fn kind_of(name: &str, value: &TraceValue) -> Option<StructureKind> {
        resolve_value(name, value).map(|r| r.kind)
    }

    #[test]
    fn test_name_tokens() {
        assert_eq!(name_tokens("minHeap"), vec!["min", "heap"]);
        assert_eq!(name_tokens("visited_set2"), vec!["visited", "set"]);
        assert_eq!(name_tokens("offset"), vec!["offset"]);
        assert_eq!(name_tokens("BFSQueue"), vec!["bfsqueue"]);
    }

    #[test]
    fn test_explicit_tag_wins() {
        let v = TraceValue::tagged(TagKind::Stack, TraceValue::ints([1, 2, 3]));
        let r = resolve_value("nums", &v).unwrap();
        assert_eq!(r.kind, StructureKind::Stack);
        assert_eq!(r.value, TraceValue::ints([1, 2, 3]));
    }

    #[test]
    fn test_tag_on_input_applies_to_current() {
        let input = TraceValue::tagged(TagKind::Queue, TraceValue::ints([1]));
        let current = TraceValue::ints([1, 2]);
        let r = resolve(
            "data",
            Snapshots {
                input: Some(&input),
                current: Some(&current),
                output: None,
            },
        )
        .unwrap();
        assert_eq!(r.kind, StructureKind::Queue);
        assert_eq!(r.value, current);
    }

    #[test]
    fn test_tagged_list_array_is_normalized() {
        let v = TraceValue::tagged(TagKind::List, TraceValue::ints([1, 2]));
        let r = resolve_value("head", &v).unwrap();
        assert_eq!(r.kind, StructureKind::LinkedList);
        assert!(matches!(r.value, TraceValue::List(ref l) if l.len() == 2));
    }

    #[test]
    fn test_bitmask_matrix_is_not_graph() {
        let v = rows(&[&[0, 1, 1], &[1, 0, 1], &[1, 1, 0]]);
        assert_eq!(kind_of("grid", &v), Some(StructureKind::Matrix));
        assert_eq!(kind_of("graph", &v), Some(StructureKind::Matrix));
    }

    #[test]
    fn test_ragged_index_rows_are_graph() {
        let v = rows(&[&[1, 2], &[0], &[0, 3], &[2]]);
        assert_eq!(kind_of("x", &v), Some(StructureKind::Graph));
    }

    #[test]
    fn test_ragged_out_of_range_rows_are_matrix() {
        let v = rows(&[&[1, 9], &[0]]);
        assert_eq!(kind_of("x", &v), Some(StructureKind::Matrix));
    }

    #[test]
    fn test_uniform_index_rows_need_graph_name() {
        let v = rows(&[&[1], &[2], &[0]]);
        assert_eq!(kind_of("pairs", &v), Some(StructureKind::Matrix));
        assert_eq!(kind_of("adj", &v), Some(StructureKind::Graph));
    }

    #[test]
    fn test_graph_requires_every_snapshot() {
        let input = rows(&[&[1, 2], &[0], &[0]]);
        let current = rows(&[&[5, 6], &[0]]);
        let r = resolve(
            "x",
            Snapshots {
                input: Some(&input),
                current: Some(&current),
                output: None,
            },
        )
        .unwrap();
        assert_eq!(r.kind, StructureKind::Matrix);
    }

    #[test]
    fn test_names_select_sequence_kinds() {
        let v = TraceValue::ints([3, 1, 2]);
        assert_eq!(kind_of("minHeap", &v), Some(StructureKind::Heap));
        assert_eq!(kind_of("stack", &v), Some(StructureKind::Stack));
        assert_eq!(kind_of("q", &v), Some(StructureKind::Queue));
        assert_eq!(kind_of("visited", &v), Some(StructureKind::Set));
        assert_eq!(kind_of("offset", &v), Some(StructureKind::Array));
        assert_eq!(kind_of("nums", &v), Some(StructureKind::Array));
    }

    #[test]
    fn test_maps_strings_and_scalars() {
        assert_eq!(
            kind_of("seen", &TraceValue::Map(BTreeMap::new())),
            Some(StructureKind::Dictionary)
        );
        assert_eq!(kind_of("s", &TraceValue::string("abc")), Some(StructureKind::String));
        assert_eq!(kind_of("s", &TraceValue::string("")), None);
        assert_eq!(kind_of("i", &TraceValue::int(3)), None);
        assert_eq!(kind_of("x", &TraceValue::Null), None);
    }

    #[test]
    fn test_array_of_lists() {
        let v = TraceValue::array([
            TraceValue::List(ListValue::from_values([TraceValue::int(1)])),
            TraceValue::List(ListValue::default()),
        ]);
        assert_eq!(kind_of("lists", &v), Some(StructureKind::LinkedLists));
    }

    #[test]
    fn test_no_snapshots() {
        assert_eq!(resolve("x", Snapshots::default()), None);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let v = rows(&[&[1, 2], &[0], &[0]]);
        assert_eq!(resolve_value("g", &v), resolve_value("g", &v));
    }
}
