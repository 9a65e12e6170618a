//! Render-ready frames.
//!
//! [`FrameBuilder::build`] runs the whole engine for one step of a trace:
//!
//! 1. pick the focus variable (given, or the most structural one)
//! 2. resolve its kind from its input, current and output snapshots
//! 3. lay it out, reusing a cached layout when the shape is unchanged
//! 4. diff it against the previous step
//! 5. place pointer markers and compute their motion since the previous step
//!
//! The resulting [`Frame`] is plain data and serializes to the JSON shape a
//! renderer consumes.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::VisualizationConfig;
use crate::diff::{self, ChangeType};
use crate::layout::{self, Layout, LayoutCache, LayoutKey};
use crate::pointer::{self, PointerMarker, PointerMotion, PointerPatterns, StructureExtent};
use crate::resolver::{self, ResolvedStructure, Snapshots, StructureKind};
use crate::trace::{Step, StepKind, Trace, TraceValue};

/// Changed elements of the focus structure. Only the fields that apply to the
/// structure's kind are set, and only when something changed.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlights {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_indices: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_node_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_cells: Option<Vec<(usize, usize)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_changes: Option<Vec<ChangeType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_indices: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_keys: Option<Vec<String>>,
}

impl Highlights {
    pub fn is_empty(&self) -> bool {
        self == &Highlights::default()
    }
}

/// What was left out of a frame because of the configured caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Truncation {
    /// Focus structure nodes beyond `maxVisualizationNodes`
    pub node_overflow: usize,
    /// Whether the trace had more than `maxSteps` steps
    pub step_overflow: bool,
}

/// Everything a renderer needs to draw one step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub step_index: usize,
    pub step_count: usize,
    pub step_kind: StepKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Variable drawn as the structure
    pub focus: Option<String>,
    pub kind: Option<StructureKind>,
    pub layout: Option<Arc<Layout>>,
    pub highlights: Highlights,
    pub pointers: Vec<PointerMarker>,
    pub motions: Vec<PointerMotion>,
    pub truncated: Truncation,
    /// Resolved kind of every structural variable at this step
    pub variable_kinds: BTreeMap<String, StructureKind>,
    /// Variables with no structure, shown as plain key/value pairs
    pub scalars: BTreeMap<String, String>,
}

/// Builds frames for a trace, memoizing layouts across calls
#[derive(Debug)]
pub struct FrameBuilder {
    config: VisualizationConfig,
    patterns: PointerPatterns,
    cache: LayoutCache,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new(VisualizationConfig::default())
    }
}

impl FrameBuilder {
    pub fn new(config: VisualizationConfig) -> Self {
        Self {
            patterns: PointerPatterns::new(&config.pointer_name_patterns),
            cache: LayoutCache::new(config.layout_cache_capacity),
            config,
        }
    }

    pub fn config(&self) -> &VisualizationConfig {
        &self.config
    }

    pub fn cache(&self) -> &LayoutCache {
        &self.cache
    }

    /// Build the frame for step `index`. `focus` names the variable to draw;
    /// without it the most structural variable of the step is chosen.
    /// Returns `None` if `index` is out of range.
    pub fn build(&mut self, trace: &Trace, index: usize, focus: Option<&str>) -> Option<Frame> {
        let step = trace.step(index)?;
        let previous = index.checked_sub(1).and_then(|i| trace.step(i));

        let mut variable_kinds = BTreeMap::new();
        let mut scalars = BTreeMap::new();
        for (name, value) in &step.values {
            match snapshots(trace, step, name).and_then(|s| resolver::resolve(name, s)) {
                Some(resolved) => {
                    variable_kinds.insert(name.clone(), resolved.kind);
                }
                None => {
                    scalars.insert(name.clone(), value.to_string());
                }
            }
        }

        let focus = match focus {
            Some(name) => Some(name.to_string()),
            None => select_focus(&variable_kinds),
        };

        let mut frame = Frame {
            step_index: index,
            step_count: trace.len(),
            step_kind: step.kind,
            line: step.line,
            label: step.label.clone(),
            focus: focus.clone(),
            kind: None,
            layout: None,
            highlights: Highlights::default(),
            pointers: Vec::new(),
            motions: Vec::new(),
            truncated: Truncation {
                node_overflow: 0,
                step_overflow: trace.step_overflow(),
            },
            variable_kinds,
            scalars,
        };

        let Some(focus) = focus else {
            return Some(frame);
        };
        let current = snapshots(trace, step, &focus).and_then(|s| resolver::resolve(&focus, s));
        let Some(resolved) = current else {
            tracing::debug!("Step {}: focus '{}' has no structure", index, focus);
            return Some(frame);
        };

        let config = &self.config;
        let layout = self
            .cache
            .get_or_compute(LayoutKey::of(&resolved), || {
                layout::compute_layout(&resolved, config)
            });

        // The previous step must hold the variable itself and resolve to the same kind
        let previous_resolved = previous
            .and_then(|prev| snapshots(trace, prev, &focus))
            .and_then(|s| resolver::resolve(&focus, s))
            .filter(|prev| prev.kind == resolved.kind);

        frame.highlights = highlights(
            previous_resolved.as_ref(),
            &resolved,
            &layout,
            config.element_diff_cap,
        );

        if let Some(extent) = StructureExtent::of(&resolved) {
            frame.pointers = pointer::extract_markers(
                &step.values,
                &self.patterns,
                &extent,
                Some(focus.as_str()),
            );
            if let (Some(prev_step), Some(prev_resolved)) = (previous, &previous_resolved) {
                if let Some(prev_extent) = StructureExtent::of(prev_resolved) {
                    let before = pointer::extract_markers(
                        &prev_step.values,
                        &self.patterns,
                        &prev_extent,
                        Some(focus.as_str()),
                    );
                    frame.motions = pointer::compute_motions(&before, &frame.pointers);
                }
            }
        }

        frame.kind = Some(resolved.kind);
        frame.truncated.node_overflow = layout.overflow;
        frame.layout = Some(layout);
        Some(frame)
    }

    /// Frames for every step, in order
    pub fn build_all(&mut self, trace: &Trace, focus: Option<&str>) -> Vec<Frame> {
        (0..trace.len())
            .filter_map(|i| self.build(trace, i, focus))
            .collect()
    }
}

/// Input and output snapshots only hint at the kind of a value the step holds.
/// A step without `name` has nothing to draw or diff against.
fn snapshots<'a>(trace: &'a Trace, step: &'a Step, name: &str) -> Option<Snapshots<'a>> {
    let current = step.value(name)?;
    Some(Snapshots {
        input: trace.input_value(name),
        current: Some(current),
        output: trace.output_value(name),
    })
}

/// Highest focus priority wins, ties go to the first name
fn select_focus(kinds: &BTreeMap<String, StructureKind>) -> Option<String> {
    let mut best: Option<(&String, u8)> = None;
    for (name, kind) in kinds {
        let priority = kind.focus_priority();
        if best.map_or(true, |(_, p)| priority > p) {
            best = Some((name, priority));
        }
    }
    best.map(|(name, _)| name.clone())
}

fn highlights(
    prev: Option<&ResolvedStructure>,
    cur: &ResolvedStructure,
    layout: &Layout,
    diff_cap: usize,
) -> Highlights {
    let mut h = Highlights::default();
    let Some(prev) = prev else {
        return h;
    };
    let drawn = |id: &str| layout.node(id).is_some();

    match (&prev.value, &cur.value) {
        (TraceValue::Tree(p), TraceValue::Tree(c)) => {
            h.changed_node_ids = non_empty(
                diff::changed_tree_node_ids(Some(p), c)
                    .into_iter()
                    .filter(|id| drawn(id))
                    .collect(),
            );
        }
        (TraceValue::Trie(p), TraceValue::Trie(c)) => {
            h.changed_node_ids = non_empty(
                diff::changed_trie_node_ids(Some(p), c)
                    .into_iter()
                    .filter(|id| drawn(id))
                    .collect(),
            );
        }
        (TraceValue::Map(p), TraceValue::Map(c)) => {
            h.changed_keys = non_empty(
                diff::changed_keys(Some(p), c)
                    .into_iter()
                    .filter(|k| drawn(k))
                    .collect(),
            );
        }
        (TraceValue::Array(p), TraceValue::Array(c)) if cur.kind == StructureKind::Matrix => {
            h.changed_cells = non_empty(
                diff::changed_matrix_cells(Some(&p[..]), c)
                    .into_iter()
                    .filter(|&(r, col)| drawn(&crate::layout::sequence::matrix_cell_id(r, col)))
                    .collect(),
            );
        }
        (TraceValue::Array(p), TraceValue::Array(c)) if cur.kind == StructureKind::LinkedLists => {
            let mut ids = Vec::new();
            for (li, list) in c.iter().enumerate() {
                let (Some(now), Some(before)) = (list_values(list), p.get(li).and_then(list_values))
                else {
                    continue;
                };
                for i in diff::changed_indices(Some(&before[..]), &now) {
                    ids.push(crate::layout::sequence::list_group_node_id(li, i));
                }
            }
            h.changed_node_ids = non_empty(ids.into_iter().filter(|id| drawn(id)).collect());
        }
        (TraceValue::Array(p), TraceValue::Array(c)) if cur.kind == StructureKind::Graph => {
            // A node changed when its adjacency row changed
            h.changed_indices = non_empty(
                diff::changed_indices(Some(&p[..]), c)
                    .into_iter()
                    .filter(|i| drawn(&i.to_string()))
                    .collect(),
            );
        }
        (p, c) => {
            let before = sequence_of(p);
            let now = sequence_of(c);
            if let (Some(before), Some(now)) = (before, now) {
                h.changed_indices = non_empty(
                    diff::changed_indices(Some(&before[..]), &now)
                        .into_iter()
                        .filter(|i| drawn(&i.to_string()))
                        .collect(),
                );
                let aligned = diff::element_changes_capped(Some(&before[..]), &now, diff_cap);
                if !aligned.is_clean() {
                    let mut changes = aligned.changes;
                    changes.truncate(layout.nodes.len());
                    h.element_changes = Some(changes);
                    h.removed_indices = non_empty(aligned.removed);
                }
            }
        }
    }
    h
}

/// Element values of sequence-like kinds, including linked lists
fn sequence_of(value: &TraceValue) -> Option<Vec<TraceValue>> {
    match value {
        TraceValue::List(list) => Some(list.values().cloned().collect()),
        other => other
            .sequence_items()
            .map(|items| items.into_iter().map(|v| v.into_owned()).collect()),
    }
}

fn list_values(value: &TraceValue) -> Option<Vec<&TraceValue>> {
    match value {
        TraceValue::List(list) => Some(list.values().collect()),
        _ => None,
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}
