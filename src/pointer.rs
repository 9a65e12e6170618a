//! Pointer variables and their motion between steps.
//!
//! A pointer is a scalar variable whose name matches one of the configured
//! patterns (`i`, `left`, `slow`, `ptr*`, ...) and whose value addresses an
//! element of the focused structure: an in-bounds index for indexed kinds, or
//! an existing node id (or `__ref`) for trees, tries and dictionaries.
//!
//! Markers are keyed by variable name, so a renderer can animate `i` from one
//! element to the next instead of redrawing it.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::resolver::{ResolvedStructure, StructureKind};
use crate::trace::TraceValue;

/// Marker colors, picked by a stable hash of the pointer name
pub const POINTER_PALETTE: [&str; 8] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4", "#f032e6", "#9a6324",
];

/// Compiled pointer name patterns.
///
/// A pattern matches a name case-insensitively when the name equals it, or
/// equals it followed by digits (`i` matches `i2`). A trailing `*` turns the
/// pattern into a prefix match (`ptr*` matches `ptrA`).
#[derive(Debug, Clone, Default)]
pub struct PointerPatterns {
    exact: HashSet<String>,
    prefixes: Vec<String>,
}

impl PointerPatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut compiled = Self::default();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim().to_lowercase();
            if let Some(prefix) = pattern.strip_suffix('*') {
                if !prefix.is_empty() {
                    compiled.prefixes.push(prefix.to_string());
                }
            } else if !pattern.is_empty() {
                compiled.exact.insert(pattern);
            }
        }
        compiled
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        if self.prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            return true;
        }
        let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
        self.exact.contains(stem)
    }
}

/// Where a pointer points
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerAddress {
    Index(usize),
    Node(String),
}

impl fmt::Display for PointerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerAddress::Index(i) => write!(f, "[{}]", i),
            PointerAddress::Node(id) => write!(f, "#{}", id),
        }
    }
}

/// The set of addresses a structure offers to pointers
#[derive(Debug, Clone, PartialEq)]
pub enum StructureExtent {
    /// Indices `0..len`
    Sequence(usize),
    /// Node ids
    Nodes(HashSet<String>),
}

impl StructureExtent {
    /// Addresses of a resolved structure. Kinds without a single addressing
    /// scheme (groups of lists) yield `None`.
    pub fn of(resolved: &ResolvedStructure) -> Option<Self> {
        let value = &resolved.value;
        match (resolved.kind, value) {
            (StructureKind::Tree, TraceValue::Tree(tree)) => Some(StructureExtent::Nodes(
                tree.nodes().iter().map(|n| n.id.clone()).collect(),
            )),
            (StructureKind::Trie, TraceValue::Trie(trie)) => Some(StructureExtent::Nodes(
                trie.nodes().iter().map(|n| n.id.clone()).collect(),
            )),
            (StructureKind::Dictionary, TraceValue::Map(entries)) => {
                Some(StructureExtent::Nodes(entries.keys().cloned().collect()))
            }
            (StructureKind::LinkedList, TraceValue::List(list)) => {
                Some(StructureExtent::Sequence(list.len()))
            }
            (kind, _) if kind.is_indexed() => value
                .sequence_items()
                .map(|items| StructureExtent::Sequence(items.len())),
            _ => None,
        }
    }

    /// Address `value` refers to, if it is in range
    pub fn address_of(&self, value: &TraceValue) -> Option<PointerAddress> {
        match (self, value) {
            (StructureExtent::Sequence(len), TraceValue::Number { .. }) => value
                .as_index()
                .filter(|i| i < len)
                .map(PointerAddress::Index),
            (StructureExtent::Sequence(len), TraceValue::PointerRef(id)) => id
                .parse::<usize>()
                .ok()
                .filter(|i| i < len)
                .map(PointerAddress::Index),
            (StructureExtent::Nodes(ids), TraceValue::String(id))
            | (StructureExtent::Nodes(ids), TraceValue::PointerRef(id)) => {
                ids.contains(id).then(|| PointerAddress::Node(id.clone()))
            }
            (StructureExtent::Nodes(ids), TraceValue::Number { .. }) => {
                let id = value.as_integer()?.to_string();
                ids.contains(&id).then_some(PointerAddress::Node(id))
            }
            _ => None,
        }
    }
}

/// A pointer drawn at one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerMarker {
    pub name: String,
    pub address: PointerAddress,
    pub color: &'static str,
    /// Stacking position among markers sharing the same address
    pub lane: usize,
}

/// A pointer that moved between two steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerMotion {
    pub name: String,
    pub from: PointerAddress,
    pub to: PointerAddress,
    pub color: &'static str,
}

/// Stable color for a pointer name (FNV-1a over the name bytes)
pub fn pointer_color(name: &str) -> &'static str {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    POINTER_PALETTE[hash as usize % POINTER_PALETTE.len()]
}

/// Markers for every pointer variable in `values` that addresses `extent`,
/// sorted by name. `exclude` is the focus variable itself.
pub fn extract_markers(
    values: &BTreeMap<String, TraceValue>,
    patterns: &PointerPatterns,
    extent: &StructureExtent,
    exclude: Option<&str>,
) -> Vec<PointerMarker> {
    let mut lanes: HashMap<PointerAddress, usize> = HashMap::new();

    values
        .iter()
        .filter(|(name, _)| Some(name.as_str()) != exclude && patterns.matches(name))
        .filter_map(|(name, value)| {
            let address = extent.address_of(value)?;
            let lane = lanes.entry(address.clone()).or_insert(0);
            let marker = PointerMarker {
                name: name.clone(),
                address,
                color: pointer_color(name),
                lane: *lane,
            };
            *lane += 1;
            Some(marker)
        })
        .collect()
}

/// Motions for pointers present at both steps whose address changed
pub fn compute_motions(prev: &[PointerMarker], cur: &[PointerMarker]) -> Vec<PointerMotion> {
    let before: HashMap<&str, &PointerAddress> =
        prev.iter().map(|m| (m.name.as_str(), &m.address)).collect();

    cur.iter()
        .filter_map(|marker| {
            let from = *before.get(marker.name.as_str())?;
            (from != &marker.address).then(|| PointerMotion {
                name: marker.name.clone(),
                from: from.clone(),
                to: marker.address.clone(),
                color: marker.color,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve_value;
    use crate::trace::TrieValue;

    fn patterns() -> PointerPatterns {
        PointerPatterns::new(&["i", "j", "left", "ptr*"])
    }

    fn values(pairs: &[(&str, TraceValue)]) -> BTreeMap<String, TraceValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_pattern_matching() {
        let p = patterns();
        assert!(p.matches("i"));
        assert!(p.matches("I"));
        assert!(p.matches("j2"));
        assert!(p.matches("Left"));
        assert!(p.matches("ptrSlow"));
        assert!(!p.matches("index"));
        assert!(!p.matches("ii"));
        assert!(!p.matches("target"));
    }

    #[test]
    fn test_sequence_addresses() {
        let extent = StructureExtent::Sequence(3);
        assert_eq!(extent.address_of(&TraceValue::int(2)), Some(PointerAddress::Index(2)));
        assert_eq!(extent.address_of(&TraceValue::int(3)), None);
        assert_eq!(extent.address_of(&TraceValue::int(-1)), None);
        assert_eq!(extent.address_of(&TraceValue::float(1.5)), None);
        assert_eq!(
            extent.address_of(&TraceValue::PointerRef("1".into())),
            Some(PointerAddress::Index(1))
        );
    }

    #[test]
    fn test_node_addresses() {
        let extent = StructureExtent::of(&resolve_value(
            "trie",
            &TraceValue::Trie(TrieValue::from_words(["ab"])),
        )
        .unwrap())
        .unwrap();
        assert_eq!(
            extent.address_of(&TraceValue::PointerRef("^a".into())),
            Some(PointerAddress::Node("^a".into()))
        );
        assert_eq!(extent.address_of(&TraceValue::string("^zz")), None);
    }

    #[test]
    fn test_markers_sorted_with_lanes() {
        let vals = values(&[
            ("j", TraceValue::int(1)),
            ("i", TraceValue::int(1)),
            ("left", TraceValue::int(0)),
            ("target", TraceValue::int(1)),
            ("i2", TraceValue::int(9)),
        ]);
        let markers = extract_markers(&vals, &patterns(), &StructureExtent::Sequence(4), None);
        let summary: Vec<(&str, usize)> =
            markers.iter().map(|m| (m.name.as_str(), m.lane)).collect();
        assert_eq!(summary, vec![("i", 0), ("j", 1), ("left", 0)]);
    }

    #[test]
    fn test_focus_variable_excluded() {
        let vals = values(&[("i", TraceValue::int(0))]);
        let markers =
            extract_markers(&vals, &patterns(), &StructureExtent::Sequence(4), Some("i"));
        assert!(markers.is_empty());
    }

    #[test]
    fn test_colors_are_stable() {
        assert_eq!(pointer_color("slow"), pointer_color("slow"));
        assert!(POINTER_PALETTE.contains(&pointer_color("fast")));
    }

    #[test]
    fn test_motions_only_for_moved_pointers() {
        let extent = StructureExtent::Sequence(5);
        let prev = extract_markers(
            &values(&[("i", TraceValue::int(0)), ("j", TraceValue::int(4))]),
            &patterns(),
            &extent,
            None,
        );
        let cur = extract_markers(
            &values(&[
                ("i", TraceValue::int(1)),
                ("j", TraceValue::int(4)),
                ("left", TraceValue::int(2)),
            ]),
            &patterns(),
            &extent,
            None,
        );
        let motions = compute_motions(&prev, &cur);
        assert_eq!(motions.len(), 1);
        assert_eq!(motions[0].name, "i");
        assert_eq!(motions[0].from, PointerAddress::Index(0));
        assert_eq!(motions[0].to, PointerAddress::Index(1));
    }

    #[test]
    fn test_motion_symmetry() {
        let extent = StructureExtent::Sequence(10);
        let a = extract_markers(
            &values(&[
                ("i", TraceValue::int(0)),
                ("j", TraceValue::int(9)),
                ("left", TraceValue::int(3)),
            ]),
            &patterns(),
            &extent,
            None,
        );
        let b = extract_markers(
            &values(&[
                ("i", TraceValue::int(2)),
                ("j", TraceValue::int(9)),
                ("ptr", TraceValue::int(1)),
            ]),
            &patterns(),
            &extent,
            None,
        );

        let forward = compute_motions(&a, &b);
        let backward = compute_motions(&b, &a);
        assert_eq!(forward.len(), backward.len());
        for (f, r) in forward.iter().zip(&backward) {
            assert_eq!(f.name, r.name);
            assert_eq!(f.from, r.to);
            assert_eq!(f.to, r.from);
        }
    }
}
