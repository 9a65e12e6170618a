//! Recorded execution traces
//!
//! A [`Trace`] is the ordered, immutable list of [`Step`]s produced by an
//! external trace recorder, together with the non-fatal [`TraceWarning`]s
//! raised while decoding it.
//!
//! # Input format
//!
//! The document is a JSON array of steps (or an object with a `steps` array):
//!
//! ```json
//! [
//!   {"kind": "input", "values": {"nums": [2, 7, 11, 15], "target": 9}},
//!   {"kind": "step", "line": 4, "values": {"i": 0, "seen": {}}},
//!   {"kind": "output", "values": {"result": [0, 1]}}
//! ]
//! ```
//!
//! Values may carry an explicit `__type` (`set`, `stack`, `queue`, `heap`,
//! `list`, `tree`, `trie`) with the payload under `value`, or be `{"__ref": id}`
//! node references. Everything else decodes heuristically.

mod parse;
pub mod step;
pub mod value;

pub use parse::{REF_KEY, TYPE_KEY};
pub use step::{Step, StepKind};
pub use value::{
    trie_prefix_id, ListNode, ListValue, TagKind, TraceValue, TreeNode, TreeValue, TrieNode,
    TrieValue,
};

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::error::{Result, ResultExt, TraceVisError};

/// Category of a non-fatal decoding problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    /// A value did not match the tagged-union contract and became null
    MalformedValue,
    /// A step was not an object or had unusable fields
    MalformedStep,
    /// Steps beyond `maxSteps` were dropped
    StepLimitExceeded,
}

/// A structured, non-fatal warning raised while decoding a trace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceWarning {
    pub kind: WarningKind,
    pub step_index: Option<usize>,
    pub key: Option<String>,
    pub message: String,
}

/// An ordered list of recorded steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    steps: Vec<Step>,
    warnings: Vec<TraceWarning>,
    step_overflow: bool,
}

impl Trace {
    /// Create a trace from already decoded steps
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            warnings: Vec::new(),
            step_overflow: false,
        }
    }

    /// Decode a trace document, keeping at most `max_steps` steps
    pub fn from_json_str(json: &str, max_steps: usize) -> Result<Self> {
        let document: Value = serde_json::from_str(json)?;
        Self::from_json_value(&document, max_steps)
    }

    /// Decode an already parsed trace document
    pub fn from_json_value(document: &Value, max_steps: usize) -> Result<Self> {
        let raw_steps = match document {
            Value::Array(steps) => steps,
            Value::Object(obj) => match obj.get("steps") {
                Some(Value::Array(steps)) => steps,
                _ => {
                    return Err(TraceVisError::Parse(serde::de::Error::custom(
                        "trace object has no steps array",
                    )))
                }
            },
            _ => {
                return Err(TraceVisError::Parse(serde::de::Error::custom(
                    "trace document must be an array of steps",
                )))
            }
        };

        let mut warnings = Vec::new();
        let step_overflow = raw_steps.len() > max_steps;
        let steps: Vec<Step> = raw_steps
            .iter()
            .take(max_steps)
            .enumerate()
            .map(|(i, raw)| parse::step_from_json(raw, i, &mut warnings))
            .collect();

        if step_overflow {
            tracing::warn!(
                "Trace has {} steps, keeping the first {}",
                raw_steps.len(),
                max_steps
            );
            warnings.push(TraceWarning {
                kind: WarningKind::StepLimitExceeded,
                step_index: Some(max_steps),
                key: None,
                message: format!("{} steps dropped", raw_steps.len() - max_steps),
            });
        }

        tracing::debug!(
            "Decoded trace with {} steps and {} warnings",
            steps.len(),
            warnings.len()
        );

        Ok(Self {
            steps,
            warnings,
            step_overflow,
        })
    }

    /// Load a trace document from disk
    pub fn load_from_file(path: &Path, max_steps: usize) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace {}", path.display()))?;
        Self::from_json_str(&json, max_steps)
            .with_context(|| format!("Failed to decode trace {}", path.display()))
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn warnings(&self) -> &[TraceWarning] {
        &self.warnings
    }

    /// Whether steps were dropped because of the step limit
    pub fn step_overflow(&self) -> bool {
        self.step_overflow
    }

    /// Value of `name` in the first input step that records it
    pub fn input_value(&self, name: &str) -> Option<&TraceValue> {
        self.steps
            .iter()
            .filter(|s| s.kind == StepKind::Input)
            .find_map(|s| s.value(name))
    }

    /// Value of `name` in the last output step that records it
    pub fn output_value(&self, name: &str) -> Option<&TraceValue> {
        self.steps
            .iter()
            .rev()
            .filter(|s| s.kind == StepKind::Output)
            .find_map(|s| s.value(name))
    }
}
