//! Decoding of producer JSON into [`TraceValue`]s and [`Step`]s.
//!
//! Decoding never fails on a single bad value: anything that does not match
//! the tagged-union contract becomes `Null` and a [`TraceWarning`] is
//! recorded with the step index and variable key.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::step::{Step, StepKind};
use super::value::{
    trie_prefix_id, ListValue, TagKind, TraceValue, TreeNode, TreeValue, TrieNode, TrieValue,
};
use super::{TraceWarning, WarningKind};

/// Discriminant key for explicit structure hints
pub const TYPE_KEY: &str = "__type";
/// Key for node references
pub const REF_KEY: &str = "__ref";

/// Maximum nesting depth followed when decoding nested trie objects
const MAX_TRIE_DEPTH: usize = 256;

pub(crate) struct ParseContext<'a> {
    pub step_index: Option<usize>,
    pub key: Option<&'a str>,
    pub warnings: &'a mut Vec<TraceWarning>,
}

impl ParseContext<'_> {
    fn warn(&mut self, message: impl Into<String>) {
        let warning = TraceWarning {
            kind: WarningKind::MalformedValue,
            step_index: self.step_index,
            key: self.key.map(str::to_string),
            message: message.into(),
        };
        tracing::warn!(
            step = ?warning.step_index,
            key = ?warning.key,
            "Malformed trace value: {}",
            warning.message
        );
        self.warnings.push(warning);
    }
}

/// Decode one JSON value
pub(crate) fn value_from_json(json: &Value, ctx: &mut ParseContext<'_>) -> TraceValue {
    match json {
        Value::Null => TraceValue::Null,
        Value::Bool(b) => TraceValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                TraceValue::int(i)
            } else if let Some(u) = n.as_u64() {
                TraceValue::Number {
                    value: u as f64,
                    is_integer: true,
                }
            } else {
                TraceValue::float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => TraceValue::String(s.clone()),
        Value::Array(items) => {
            TraceValue::Array(items.iter().map(|v| value_from_json(v, ctx)).collect())
        }
        Value::Object(map) => object_from_json(map, ctx),
    }
}

fn object_from_json(map: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> TraceValue {
    if let Some(target) = map.get(REF_KEY) {
        return match id_from_json(target) {
            Some(id) => TraceValue::PointerRef(id),
            None => {
                ctx.warn(format!("{} must be a string or integer id", REF_KEY));
                TraceValue::Null
            }
        };
    }

    let Some(type_field) = map.get(TYPE_KEY) else {
        return TraceValue::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), value_from_json(v, ctx)))
                .collect(),
        );
    };

    let Some(type_name) = type_field.as_str() else {
        ctx.warn(format!("{} must be a string", TYPE_KEY));
        return TraceValue::Null;
    };
    let inner = map.get("value").unwrap_or(&Value::Null);

    match type_name {
        "list" => list_from_json(map, inner, ctx),
        "tree" => tree_from_json(inner, ctx),
        "trie" => trie_from_json(inner, ctx),
        "map" | "dict" => match inner {
            Value::Object(entries) => TraceValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), value_from_json(v, ctx)))
                    .collect(),
            ),
            _ => {
                ctx.warn("map value must be an object");
                TraceValue::Null
            }
        },
        "pointer" => match id_from_json(inner) {
            Some(id) => TraceValue::PointerRef(id),
            None => {
                ctx.warn("pointer value must be a string or integer id");
                TraceValue::Null
            }
        },
        other => match TagKind::from_type_name(other) {
            Some(kind) => match inner {
                Value::Array(_) => TraceValue::tagged(kind, value_from_json(inner, ctx)),
                _ => {
                    ctx.warn(format!("{} value must be an array", other));
                    TraceValue::Null
                }
            },
            None => {
                ctx.warn(format!("unknown {} '{}'", TYPE_KEY, other));
                TraceValue::Null
            }
        },
    }
}

fn id_from_json(json: &Value) -> Option<String> {
    match json {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn list_from_json(
    map: &Map<String, Value>,
    inner: &Value,
    ctx: &mut ParseContext<'_>,
) -> TraceValue {
    let Value::Array(items) = inner else {
        ctx.warn("list value must be an array");
        return TraceValue::Null;
    };

    let values: Vec<TraceValue> = items.iter().map(|v| value_from_json(v, ctx)).collect();
    let len = values.len();
    let mut list = ListValue::from_values(values);

    match map.get("cycleIndex") {
        None | Some(Value::Null) => {}
        Some(v) => match v.as_u64().map(|i| i as usize) {
            Some(i) if i < len => list.cycle_index = Some(i),
            _ => ctx.warn(format!("cycleIndex {} is not a valid node index", v)),
        },
    }
    list.is_truncated = map
        .get("isTruncated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    list.is_doubly = map.get("isDoubly").and_then(Value::as_bool).unwrap_or(false);

    TraceValue::List(list)
}

fn tree_from_json(inner: &Value, ctx: &mut ParseContext<'_>) -> TraceValue {
    match inner {
        Value::Array(items) => {
            let values: Vec<TraceValue> = items.iter().map(|v| value_from_json(v, ctx)).collect();
            TraceValue::Tree(TreeValue::from_level_order(&values))
        }
        Value::Object(obj) => {
            let Some(Value::Array(raw_nodes)) = obj.get("nodes") else {
                ctx.warn("tree value must contain a nodes array");
                return TraceValue::Null;
            };

            let mut nodes = Vec::with_capacity(raw_nodes.len());
            for raw in raw_nodes {
                let Some(id) = raw.get("id").and_then(id_from_json) else {
                    ctx.warn("tree node without an id skipped");
                    continue;
                };
                let value = raw
                    .get("value")
                    .map(|v| value_from_json(v, ctx))
                    .unwrap_or(TraceValue::Null);
                nodes.push(TreeNode {
                    id,
                    value,
                    left: raw.get("left").and_then(id_from_json),
                    right: raw.get("right").and_then(id_from_json),
                });
            }

            let root_id = obj
                .get("rootId")
                .and_then(id_from_json)
                .or_else(|| nodes.first().map(|n| n.id.clone()));
            TraceValue::Tree(TreeValue::new(nodes, root_id))
        }
        Value::Null => TraceValue::Tree(TreeValue::default()),
        _ => {
            ctx.warn("tree value must be an array or an object");
            TraceValue::Null
        }
    }
}

fn trie_from_json(inner: &Value, ctx: &mut ParseContext<'_>) -> TraceValue {
    match inner {
        Value::Array(words) => {
            let words: Vec<&str> = words.iter().filter_map(Value::as_str).collect();
            TraceValue::Trie(TrieValue::from_words(words))
        }
        Value::Object(obj) if obj.contains_key("nodes") => {
            let Some(Value::Array(raw_nodes)) = obj.get("nodes") else {
                ctx.warn("trie nodes must be an array");
                return TraceValue::Null;
            };

            let mut nodes = Vec::with_capacity(raw_nodes.len());
            for raw in raw_nodes {
                let Some(id) = raw.get("id").and_then(id_from_json) else {
                    ctx.warn("trie node without an id skipped");
                    continue;
                };
                let character = raw
                    .get("char")
                    .and_then(Value::as_str)
                    .and_then(|s| s.chars().next());
                let children = raw
                    .get("children")
                    .and_then(Value::as_array)
                    .map(|c| c.iter().filter_map(id_from_json).collect())
                    .unwrap_or_default();
                nodes.push(TrieNode {
                    id,
                    character,
                    is_end: raw.get("isEnd").and_then(Value::as_bool).unwrap_or(false),
                    children,
                });
            }

            let root_id = obj
                .get("rootId")
                .and_then(id_from_json)
                .or_else(|| nodes.first().map(|n| n.id.clone()));
            TraceValue::Trie(TrieValue::new(nodes, root_id))
        }
        Value::Object(obj) => {
            let mut nodes = Vec::new();
            nested_trie_nodes(obj, String::new(), 0, &mut nodes);
            TraceValue::Trie(TrieValue::new(nodes, Some(trie_prefix_id(""))))
        }
        _ => {
            ctx.warn("trie value must be an array of words or an object");
            TraceValue::Null
        }
    }
}

/// Flatten `{"isEnd": bool, "children": {"a": {...}}}` into prefix-keyed nodes
fn nested_trie_nodes(
    obj: &Map<String, Value>,
    prefix: String,
    depth: usize,
    out: &mut Vec<TrieNode>,
) {
    let id = trie_prefix_id(&prefix);
    let slot = out.len();
    out.push(TrieNode {
        id,
        character: prefix.chars().last(),
        is_end: obj.get("isEnd").and_then(Value::as_bool).unwrap_or(false),
        children: Vec::new(),
    });

    if depth >= MAX_TRIE_DEPTH {
        return;
    }
    let Some(Value::Object(children)) = obj.get("children") else {
        return;
    };

    // serde_json maps are sorted by key, so children come out in char order
    for (key, child) in children {
        let Some(c) = key.chars().next() else {
            continue;
        };
        let Value::Object(child_obj) = child else {
            continue;
        };
        let child_prefix = format!("{}{}", prefix, c);
        out[slot].children.push(trie_prefix_id(&child_prefix));
        nested_trie_nodes(child_obj, child_prefix, depth + 1, out);
    }
}

/// Decode one step object. Malformed steps become empty `Step`s.
pub(crate) fn step_from_json(
    json: &Value,
    step_index: usize,
    warnings: &mut Vec<TraceWarning>,
) -> Step {
    let Value::Object(obj) = json else {
        push_step_warning(warnings, step_index, "step must be an object");
        return Step::default();
    };

    let kind = match obj.get("kind") {
        None => StepKind::Step,
        Some(Value::String(name)) => StepKind::from_name(name).unwrap_or_else(|| {
            push_step_warning(warnings, step_index, format!("unknown step kind '{}'", name));
            StepKind::Step
        }),
        Some(other) => {
            push_step_warning(warnings, step_index, format!("step kind {} is not a string", other));
            StepKind::Step
        }
    };

    let line = obj
        .get("line")
        .and_then(Value::as_u64)
        .and_then(|l| u32::try_from(l).ok());
    let label = obj.get("label").and_then(Value::as_str).map(str::to_string);

    let mut values = BTreeMap::new();
    match obj.get("values") {
        None | Some(Value::Null) => {}
        Some(Value::Object(raw_values)) => {
            for (key, raw) in raw_values {
                let mut ctx = ParseContext {
                    step_index: Some(step_index),
                    key: Some(key),
                    warnings: &mut *warnings,
                };
                values.insert(key.clone(), value_from_json(raw, &mut ctx));
            }
        }
        Some(_) => push_step_warning(warnings, step_index, "step values must be an object"),
    }

    Step {
        kind,
        line,
        label,
        values,
    }
}

fn push_step_warning(
    warnings: &mut Vec<TraceWarning>,
    step_index: usize,
    message: impl Into<String>,
) {
    let message = message.into();
    tracing::warn!(step = step_index, "Malformed trace step: {}", message);
    warnings.push(TraceWarning {
        kind: WarningKind::MalformedStep,
        step_index: Some(step_index),
        key: None,
        message,
    });
}
