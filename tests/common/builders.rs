//! Test data builders for creating traces

use tracevis_rs::{Step, StepKind, Trace, TraceValue};

/// Builder for step-by-step test traces
#[derive(Default)]
pub struct TraceBuilder {
    steps: Vec<Step>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an input step
    pub fn input(self, values: &[(&str, TraceValue)]) -> Self {
        self.push(StepKind::Input, values)
    }

    /// Append an intermediate step
    pub fn step(self, values: &[(&str, TraceValue)]) -> Self {
        self.push(StepKind::Step, values)
    }

    /// Append an output step
    pub fn output(self, values: &[(&str, TraceValue)]) -> Self {
        self.push(StepKind::Output, values)
    }

    /// Append `count` empty steps
    pub fn empty_steps(mut self, count: usize) -> Self {
        self.steps.extend((0..count).map(|_| Step::new(StepKind::Step)));
        self
    }

    fn push(mut self, kind: StepKind, values: &[(&str, TraceValue)]) -> Self {
        let step = values.iter().fold(Step::new(kind), |s, (name, value)| {
            s.with_value(*name, value.clone())
        });
        self.steps.push(step);
        self
    }

    pub fn build(self) -> Trace {
        Trace::new(self.steps)
    }
}

