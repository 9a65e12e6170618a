//! End-to-end frame building over complete traces

mod common;

use common::builders::TraceBuilder;
use common::load_fixture;
use std::collections::BTreeMap;
use tracevis_rs::{
    pointer::PointerAddress,
    trace::{TagKind, TreeValue},
    FrameBuilder, StepKind, StructureKind, Trace, TraceValue,
};

#[test]
fn test_two_sum_walkthrough() {
    let trace = load_fixture("two_sum.json");
    assert_eq!(trace.len(), 4);
    assert!(trace.warnings().is_empty());

    let mut builder = FrameBuilder::default();
    let frames = builder.build_all(&trace, None);
    assert_eq!(frames.len(), 4);

    let second = &frames[2];
    assert_eq!(second.step_kind, StepKind::Step);
    assert_eq!(second.line, Some(4));
    assert_eq!(second.focus.as_deref(), Some("nums"));
    assert_eq!(second.kind, Some(StructureKind::Array));
    assert_eq!(second.variable_kinds.get("nums"), Some(&StructureKind::Array));
    assert_eq!(second.variable_kinds.get("seen"), Some(&StructureKind::Dictionary));
    assert!(second.variable_kinds.get("i").is_none());
    assert_eq!(second.scalars.get("complement").map(String::as_str), Some("2"));

    // nums never changes
    assert!(second.highlights.is_empty());

    assert_eq!(second.motions.len(), 1);
    let motion = &second.motions[0];
    assert_eq!(motion.name, "i");
    assert_eq!(motion.from, PointerAddress::Index(0));
    assert_eq!(motion.to, PointerAddress::Index(1));

    // The output step has no nums; its result array becomes the focus
    assert_eq!(frames[3].focus.as_deref(), Some("result"));
    assert!(frames[3].motions.is_empty());
}

#[test]
fn test_frame_json_shape() {
    let trace = load_fixture("two_sum.json");
    let frame = FrameBuilder::default().build(&trace, 1, None).unwrap();
    let json = serde_json::to_value(&frame).unwrap();

    assert_eq!(json["stepIndex"], 1);
    assert_eq!(json["kind"], "array");
    assert_eq!(json["layout"]["nodes"][0]["id"], "0");
    assert!(json["layout"]["nodes"][0]["x"].is_number());
    assert_eq!(json["pointers"][0]["name"], "i");
    assert_eq!(json["pointers"][0]["address"]["index"], 0);
    assert_eq!(json["truncated"]["stepOverflow"], false);
    assert!(json["highlights"].as_object().unwrap().is_empty());
}

#[test]
fn test_dictionary_focus_highlights_new_key() {
    let trace = load_fixture("two_sum.json");
    let frame = FrameBuilder::default().build(&trace, 2, Some("seen")).unwrap();
    assert_eq!(frame.kind, Some(StructureKind::Dictionary));
    assert_eq!(frame.highlights.changed_keys, Some(vec!["7".to_string()]));
}

#[test]
fn test_variable_first_seen_mid_trace_has_no_highlights() {
    let trace = TraceBuilder::new()
        .input(&[("nums", TraceValue::ints([3, 1]))])
        .step(&[("i", TraceValue::int(0))])
        .step(&[("ans", TraceValue::ints([5])), ("i", TraceValue::int(1))])
        .output(&[("ans", TraceValue::ints([9, 6]))])
        .build();
    assert_eq!(trace.len(), 4);
    assert_eq!(trace.steps()[0].kind, StepKind::Input);

    let mut builder = FrameBuilder::default();
    let appeared = builder.build(&trace, 2, Some("ans")).unwrap();
    assert_eq!(appeared.kind, Some(StructureKind::Array));
    assert!(appeared.highlights.is_empty());

    // The input value is not drawn for a step that lacks nums
    let missing = builder.build(&trace, 1, Some("nums")).unwrap();
    assert!(missing.kind.is_none());
    assert!(missing.layout.is_none());
}

#[test]
fn test_tree_identity_across_steps() {
    let level_order = |vals: &[Option<i64>]| {
        TraceValue::Tree(TreeValue::from_level_order(
            &vals
                .iter()
                .map(|v| v.map(TraceValue::int).unwrap_or(TraceValue::Null))
                .collect::<Vec<_>>(),
        ))
    };
    let trace = TraceBuilder::new()
        .step(&[("root", level_order(&[Some(4), Some(2), Some(6)]))])
        .step(&[("root", level_order(&[Some(4), Some(2), Some(7)]))])
        .build();

    let mut builder = FrameBuilder::default();
    let first = builder.build(&trace, 0, None).unwrap();
    let second = builder.build(&trace, 1, None).unwrap();

    let ids = |f: &tracevis_rs::Frame| -> Vec<String> {
        f.layout.as_ref().unwrap().nodes.iter().map(|n| n.id.clone()).collect()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(second.kind, Some(StructureKind::Tree));
    assert_eq!(second.highlights.changed_node_ids.as_ref().map(Vec::len), Some(1));
}

#[test]
fn test_tagged_heap_drawn_as_tree() {
    let heap = TraceValue::tagged(TagKind::Heap, TraceValue::ints([1, 3, 2, 7]));
    let trace = TraceBuilder::new().step(&[("data", heap)]).build();

    let frame = FrameBuilder::default().build(&trace, 0, None).unwrap();
    assert_eq!(frame.kind, Some(StructureKind::Heap));
    let layout = frame.layout.unwrap();
    assert_eq!(layout.nodes.len(), 4);
    assert_eq!(layout.edges.len(), 3);
}

#[test]
fn test_graph_from_adjacency() {
    let adjacency = TraceValue::array([
        TraceValue::ints([1, 2]),
        TraceValue::ints([0]),
        TraceValue::ints([0, 3]),
        TraceValue::ints([2]),
    ]);
    let trace = TraceBuilder::new()
        .step(&[("adj", adjacency), ("node", TraceValue::int(2))])
        .build();

    let frame = FrameBuilder::default().build(&trace, 0, None).unwrap();
    assert_eq!(frame.kind, Some(StructureKind::Graph));
    let layout = frame.layout.as_ref().unwrap();
    assert_eq!(layout.nodes.len(), 4);
    assert_eq!(layout.edges.len(), 3);
    assert_eq!(frame.pointers.len(), 1);
    assert_eq!(frame.pointers[0].address, PointerAddress::Index(2));
}

#[test]
fn test_malformed_values_degrade_to_scalars() {
    let json = r#"[
        {"kind": "step", "values": {"x": {"__type": "wat", "value": 1}, "nums": [1, 2]}},
        "not a step"
    ]"#;
    let trace = Trace::from_json_str(json, 100).unwrap();
    assert_eq!(trace.len(), 2);
    assert_eq!(trace.warnings().len(), 2);

    let frame = FrameBuilder::default().build(&trace, 0, None).unwrap();
    assert_eq!(frame.focus.as_deref(), Some("nums"));
    assert_eq!(frame.scalars.get("x").map(String::as_str), Some("null"));

    let empty = FrameBuilder::default().build(&trace, 1, None).unwrap();
    assert!(empty.focus.is_none());
    assert!(empty.layout.is_none());
}

#[test]
fn test_step_limit_reported() {
    let json = serde_json::to_string(
        &(0..10)
            .map(|i| serde_json::json!({"kind": "step", "values": {"nums": [i]}}))
            .collect::<Vec<_>>(),
    )
    .unwrap();
    let trace = Trace::from_json_str(&json, 4).unwrap();
    assert_eq!(trace.len(), 4);

    let frame = FrameBuilder::default().build(&trace, 0, None).unwrap();
    assert!(frame.truncated.step_overflow);
}

#[test]
fn test_non_array_document_is_error() {
    assert!(Trace::from_json_str(r#"{"kind": "step"}"#, 10).is_err());
    assert!(Trace::from_json_str("42", 10).is_err());
}

#[test]
fn test_missing_focus_yields_bare_frame() {
    let trace = TraceBuilder::new()
        .step(&[("nums", TraceValue::ints([1]))])
        .build();
    let frame = FrameBuilder::default().build(&trace, 0, Some("absent")).unwrap();
    assert_eq!(frame.focus.as_deref(), Some("absent"));
    assert!(frame.kind.is_none());
    assert_eq!(frame.variable_kinds, BTreeMap::from([("nums".to_string(), StructureKind::Array)]));
}
