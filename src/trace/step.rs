//! Recorded steps

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::value::TraceValue;

/// Position of a step within the traced run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Arguments before the algorithm runs
    Input,
    /// Intermediate state
    #[default]
    Step,
    /// Final result
    Output,
}

impl StepKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "input" => Some(StepKind::Input),
            "step" => Some(StepKind::Step),
            "output" => Some(StepKind::Output),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StepKind::Input => "Input",
            StepKind::Step => "Step",
            StepKind::Output => "Output",
        }
    }
}

/// One recorded moment of program state. Identity is the step's position in
/// the trace.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Step {
    pub kind: StepKind,
    /// Source line being executed
    pub line: Option<u32>,
    pub label: Option<String>,
    pub values: BTreeMap<String, TraceValue>,
}

impl Step {
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: TraceValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn value(&self, name: &str) -> Option<&TraceValue> {
        self.values.get(name)
    }
}
