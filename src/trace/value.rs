//! Snapshot value model
//!
//! [`TraceValue`] is the closed tagged union every recorded datum is decoded
//! into. Linked lists, trees and tries are stored as flat arenas with string
//! ids so they can contain cycles or shared nodes without owning references,
//! and so that node identity survives from one step to the next.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

/// Explicit structure hint carried by a `__type` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Set,
    Stack,
    Queue,
    Heap,
    List,
    Tree,
}

impl TagKind {
    /// Parse a `__type` discriminant that wraps an inner array
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "set" => Some(TagKind::Set),
            "stack" => Some(TagKind::Stack),
            "queue" => Some(TagKind::Queue),
            "heap" => Some(TagKind::Heap),
            "list" => Some(TagKind::List),
            "tree" => Some(TagKind::Tree),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Set => "set",
            TagKind::Stack => "stack",
            TagKind::Queue => "queue",
            TagKind::Heap => "heap",
            TagKind::List => "list",
            TagKind::Tree => "tree",
        }
    }
}

/// A single recorded value
#[derive(Debug, Clone, PartialEq)]
pub enum TraceValue {
    Null,
    Bool(bool),
    Number { value: f64, is_integer: bool },
    String(String),
    Array(Vec<TraceValue>),
    /// Key order carries no meaning; a BTreeMap keeps iteration deterministic.
    Map(BTreeMap<String, TraceValue>),
    List(ListValue),
    Tree(TreeValue),
    Trie(TrieValue),
    /// Reference to a node id inside a list/tree/trie
    PointerRef(String),
    /// Explicit structure hint around an inner value
    Tagged {
        kind: TagKind,
        inner: Box<TraceValue>,
    },
}

impl TraceValue {
    pub fn int(value: i64) -> Self {
        TraceValue::Number {
            value: value as f64,
            is_integer: true,
        }
    }

    pub fn float(value: f64) -> Self {
        TraceValue::Number {
            value,
            is_integer: false,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        TraceValue::String(value.into())
    }

    pub fn array(values: impl IntoIterator<Item = TraceValue>) -> Self {
        TraceValue::Array(values.into_iter().collect())
    }

    pub fn ints(values: impl IntoIterator<Item = i64>) -> Self {
        TraceValue::Array(values.into_iter().map(TraceValue::int).collect())
    }

    pub fn tagged(kind: TagKind, inner: TraceValue) -> Self {
        TraceValue::Tagged {
            kind,
            inner: Box::new(inner),
        }
    }

    /// Short name of the variant, used in warnings and logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            TraceValue::Null => "null",
            TraceValue::Bool(_) => "bool",
            TraceValue::Number { .. } => "number",
            TraceValue::String(_) => "string",
            TraceValue::Array(_) => "array",
            TraceValue::Map(_) => "map",
            TraceValue::List(_) => "list",
            TraceValue::Tree(_) => "tree",
            TraceValue::Trie(_) => "trie",
            TraceValue::PointerRef(_) => "pointer",
            TraceValue::Tagged { .. } => "tagged",
        }
    }

    /// True for null, bool, number, string and pointer references
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TraceValue::Null
                | TraceValue::Bool(_)
                | TraceValue::Number { .. }
                | TraceValue::String(_)
                | TraceValue::PointerRef(_)
        )
    }

    /// Integer value, if this is an integral number
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TraceValue::Number {
                value,
                is_integer: true,
            } => Some(*value as i64),
            _ => None,
        }
    }

    /// Non-negative integer value usable as an index
    pub fn as_index(&self) -> Option<usize> {
        self.as_integer().and_then(|v| usize::try_from(v).ok())
    }

    pub fn as_array(&self) -> Option<&[TraceValue]> {
        match self {
            TraceValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TraceValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Split off an explicit tag, returning the hint and the wrapped value
    pub fn untagged(&self) -> (Option<TagKind>, &TraceValue) {
        match self {
            TraceValue::Tagged { kind, inner } => (Some(*kind), inner.as_ref()),
            other => (None, other),
        }
    }

    /// The elements of a sequence-shaped value in display order.
    ///
    /// Arrays (tagged or not) yield their items, linked lists their node
    /// values, and strings one single-character string per char.
    pub fn sequence_items(&self) -> Option<Vec<Cow<'_, TraceValue>>> {
        match self {
            TraceValue::Array(items) => Some(items.iter().map(Cow::Borrowed).collect()),
            TraceValue::Tagged { inner, .. } => inner.sequence_items(),
            TraceValue::List(list) => Some(list.values().map(Cow::Borrowed).collect()),
            TraceValue::String(s) => Some(
                s.chars()
                    .map(|c| Cow::Owned(TraceValue::String(c.to_string())))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for TraceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceValue::Null => write!(f, "null"),
            TraceValue::Bool(b) => write!(f, "{}", b),
            TraceValue::Number {
                value,
                is_integer: true,
            } => write!(f, "{}", *value as i64),
            TraceValue::Number { value, .. } => write!(f, "{}", value),
            TraceValue::String(s) => write!(f, "{}", s),
            TraceValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            TraceValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            TraceValue::List(list) => {
                for (i, value) in list.values().enumerate() {
                    if i > 0 {
                        write!(f, " -> ")?;
                    }
                    write!(f, "{}", value)?;
                }
                if let Some(cycle) = list.cycle_index {
                    write!(f, " -> @{}", cycle)?;
                } else if list.is_truncated {
                    write!(f, " -> ...")?;
                }
                Ok(())
            }
            TraceValue::Tree(tree) => write!(f, "tree({} nodes)", tree.len()),
            TraceValue::Trie(trie) => write!(f, "trie({} nodes)", trie.len()),
            TraceValue::PointerRef(id) => write!(f, "&{}", id),
            TraceValue::Tagged { kind, inner } => write!(f, "{}{}", kind.as_str(), inner),
        }
    }
}

// ==================== Linked List ====================

#[derive(Debug, Clone, PartialEq)]
pub struct ListNode {
    pub value: TraceValue,
}

/// Linked list flattened into traversal order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListValue {
    pub nodes: Vec<ListNode>,
    /// Index the last node links back to, if the list is cyclic
    pub cycle_index: Option<usize>,
    pub is_truncated: bool,
    pub is_doubly: bool,
}

impl ListValue {
    pub fn from_values(values: impl IntoIterator<Item = TraceValue>) -> Self {
        Self {
            nodes: values.into_iter().map(|value| ListNode { value }).collect(),
            ..Default::default()
        }
    }

    /// Set the cycle target. Out-of-range indices are ignored.
    pub fn with_cycle(mut self, index: Option<usize>) -> Self {
        self.cycle_index = index.filter(|&i| i < self.nodes.len());
        self
    }

    pub fn doubly(mut self, is_doubly: bool) -> Self {
        self.is_doubly = is_doubly;
        self
    }

    /// Build a list by walking `next` links from `head`.
    ///
    /// A visited set guarantees termination: the first revisited key becomes
    /// the cycle target. Walking stops after `limit` nodes with
    /// `is_truncated` set.
    pub fn from_links<K, N, V>(head: Option<K>, mut next: N, mut value: V, limit: usize) -> Self
    where
        K: Eq + Hash + Clone,
        N: FnMut(&K) -> Option<K>,
        V: FnMut(&K) -> TraceValue,
    {
        let mut list = ListValue::default();
        let mut visited: HashMap<K, usize> = HashMap::new();
        let mut cursor = head;

        while let Some(key) = cursor {
            if let Some(&seen_at) = visited.get(&key) {
                list.cycle_index = Some(seen_at);
                break;
            }
            if list.nodes.len() >= limit {
                list.is_truncated = true;
                break;
            }
            visited.insert(key.clone(), list.nodes.len());
            list.nodes.push(ListNode { value: value(&key) });
            cursor = next(&key);
        }

        list
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &TraceValue> {
        self.nodes.iter().map(|n| &n.value)
    }
}

// ==================== Binary Tree ====================

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: String,
    pub value: TraceValue,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl TreeNode {
    pub fn new(id: impl Into<String>, value: TraceValue) -> Self {
        Self {
            id: id.into(),
            value,
            left: None,
            right: None,
        }
    }

    pub fn with_children(mut self, left: Option<&str>, right: Option<&str>) -> Self {
        self.left = left.map(str::to_string);
        self.right = right.map(str::to_string);
        self
    }

    /// Present children in left, right order
    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.left.iter().chain(self.right.iter()).map(String::as_str)
    }
}

/// Binary tree stored as a flat node arena.
///
/// - Node ids are the producer's identities and must be stable across steps.
/// - Id lookups are O(1) via an index map.
/// - Duplicate ids keep the first occurrence.
#[derive(Debug, Clone, Default)]
pub struct TreeValue {
    nodes: Vec<TreeNode>,
    root_id: Option<String>,
    index: HashMap<String, usize>,
}

impl PartialEq for TreeValue {
    fn eq(&self, other: &Self) -> bool {
        self.root_id == other.root_id && self.nodes == other.nodes
    }
}

impl TreeValue {
    pub fn new(nodes: Vec<TreeNode>, root_id: Option<String>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut unique = Vec::with_capacity(nodes.len());
        for node in nodes {
            if index.contains_key(&node.id) {
                continue;
            }
            index.insert(node.id.clone(), unique.len());
            unique.push(node);
        }
        Self {
            nodes: unique,
            root_id,
            index,
        }
    }

    /// Build from a level-order array where nulls mark missing children.
    ///
    /// Node ids are root paths (`t`, `tL`, `tLR`, ...), the only identity
    /// a bare level-order array carries.
    pub fn from_level_order(values: &[TraceValue]) -> Self {
        let mut nodes: Vec<TreeNode> = Vec::new();
        let Some(first) = values.first() else {
            return Self::default();
        };
        if matches!(first, TraceValue::Null) {
            return Self::default();
        }

        nodes.push(TreeNode::new("t", first.clone()));
        let mut parents = std::collections::VecDeque::from([0usize]);
        let mut cursor = 1;

        while cursor < values.len() {
            let Some(parent) = parents.pop_front() else {
                break;
            };
            for side in ['L', 'R'] {
                let Some(value) = values.get(cursor) else {
                    break;
                };
                cursor += 1;
                if matches!(value, TraceValue::Null) {
                    continue;
                }
                let id = format!("{}{}", nodes[parent].id, side);
                if side == 'L' {
                    nodes[parent].left = Some(id.clone());
                } else {
                    nodes[parent].right = Some(id.clone());
                }
                parents.push_back(nodes.len());
                nodes.push(TreeNode::new(id, value.clone()));
            }
        }

        Self::new(nodes, Some("t".to_string()))
    }

    /// View an array-backed binary heap as a tree keyed by array index
    pub fn from_heap_array(values: &[TraceValue]) -> Self {
        let n = values.len();
        let nodes = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let child = |c: usize| (c < n).then(|| c.to_string());
                TreeNode {
                    id: i.to_string(),
                    value: value.clone(),
                    left: child(2 * i + 1),
                    right: child(2 * i + 2),
                }
            })
            .collect();
        Self::new(nodes, (n > 0).then(|| "0".to_string()))
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root_id.as_deref().and_then(|id| self.node(id))
    }

    pub fn node(&self, id: &str) -> Option<&TreeNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ==================== Trie ====================

#[derive(Debug, Clone, PartialEq)]
pub struct TrieNode {
    pub id: String,
    /// `None` for the root
    pub character: Option<char>,
    pub is_end: bool,
    pub children: Vec<String>,
}

/// Prefix tree stored as a flat node arena with the same identity rules as
/// [`TreeValue`].
#[derive(Debug, Clone, Default)]
pub struct TrieValue {
    nodes: Vec<TrieNode>,
    root_id: Option<String>,
    index: HashMap<String, usize>,
}

impl PartialEq for TrieValue {
    fn eq(&self, other: &Self) -> bool {
        self.root_id == other.root_id && self.nodes == other.nodes
    }
}

/// Id of the trie node reached by `prefix`
pub fn trie_prefix_id(prefix: &str) -> String {
    format!("^{}", prefix)
}

impl TrieValue {
    pub fn new(nodes: Vec<TrieNode>, root_id: Option<String>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut unique = Vec::with_capacity(nodes.len());
        for node in nodes {
            if index.contains_key(&node.id) {
                continue;
            }
            index.insert(node.id.clone(), unique.len());
            unique.push(node);
        }
        Self {
            nodes: unique,
            root_id,
            index,
        }
    }

    /// Build a trie from words. Node ids are `^` followed by the node's
    /// prefix, so the same prefix keeps its id as words are inserted.
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut children: BTreeMap<String, Vec<char>> = BTreeMap::new();
        let mut ends: std::collections::HashSet<String> = std::collections::HashSet::new();
        children.insert(String::new(), Vec::new());

        for word in words {
            let mut prefix = String::new();
            for c in word.chars() {
                let next = format!("{}{}", prefix, c);
                let siblings = children.entry(prefix.clone()).or_default();
                if !siblings.contains(&c) {
                    siblings.push(c);
                }
                children.entry(next.clone()).or_default();
                prefix = next;
            }
            ends.insert(prefix);
        }

        let nodes = children
            .iter()
            .map(|(prefix, chars)| {
                let mut sorted = chars.clone();
                sorted.sort_unstable();
                TrieNode {
                    id: trie_prefix_id(prefix),
                    character: prefix.chars().last(),
                    is_end: ends.contains(prefix),
                    children: sorted
                        .into_iter()
                        .map(|c| trie_prefix_id(&format!("{}{}", prefix, c)))
                        .collect(),
                }
            })
            .collect();

        Self::new(nodes, Some(trie_prefix_id("")))
    }

    pub fn nodes(&self) -> &[TrieNode] {
        &self.nodes
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    pub fn node(&self, id: &str) -> Option<&TrieNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
