pub mod matcher;
pub mod orchestrator;
pub mod outcome;
pub mod template;

pub use matcher::{match_rules, trace_rules};
pub use orchestrator::{Interpreter, SampleLocks};
pub use outcome::{
    Evaluation, InterpretationView, RuleMatch, RuleOutcome, RuleTrace, SkipReason,
};
pub use template::{MessageTemplate, Placeholder, RenderContext};

use crate::model::{NewInterpretation, Sample};
use crate::rules::schema::Rule;

/// Match rules against a sample and render one interpretation per match.
pub fn interpret_sample(sample: &Sample, rules: &[Rule]) -> Vec<NewInterpretation> {
    match_rules(sample, rules)
        .into_iter()
        .map(|m| NewInterpretation {
            sample_id: sample.id,
            rule_id: m.rule.id,
            message: m
                .rule
                .message
                .render(&RenderContext::new(sample, m.unit, m.result)),
            severity: m.rule.severity,
        })
        .collect()
}
