use crate::model::{AnalyteResult, AppliedInterpretation, NewInterpretation, SampleUnit};
use crate::rules::schema::Rule;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One rule matching one result of one unit.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'a> {
    pub rule: &'a Rule,
    pub unit: &'a SampleUnit,
    pub result: &'a AnalyteResult,
}

/// Why a rule was not considered for a sample at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SkipReason {
    Inactive,
    /// No result in the sample was tested in the rule's area.
    AreaNotTested { area: String },
    SpeciesMismatch {
        expected: String,
        actual: Option<String>,
    },
    CropMismatch {
        expected: String,
        actual: Option<String>,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Inactive => write!(f, "rule is inactive"),
            SkipReason::AreaNotTested { area } => {
                write!(f, "no result in the sample was tested in area '{area}'")
            }
            SkipReason::SpeciesMismatch { expected, actual } => write!(
                f,
                "species '{}' does not match rule species '{}'",
                actual.as_deref().unwrap_or("N/A"),
                expected
            ),
            SkipReason::CropMismatch { expected, actual } => write!(
                f,
                "next crop '{}' does not match rule crop '{}'",
                actual.as_deref().unwrap_or("N/A"),
                expected
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RuleOutcome {
    Skipped(SkipReason),
    Evaluated {
        /// Results whose analyte name contains the rule's pattern.
        candidates: usize,
        /// Candidates that satisfied the condition.
        matches: usize,
    },
}

/// Per-rule explanation of a matching pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTrace {
    pub rule_id: Uuid,
    pub analyte: String,
    pub condition: String,
    pub outcome: RuleOutcome,
}

impl RuleTrace {
    pub fn matched(&self) -> bool {
        matches!(self.outcome, RuleOutcome::Evaluated { matches, .. } if matches > 0)
    }
}

/// A stored interpretation joined with the rule that produced it.
///
/// `rule` is `None` when the referenced rule no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretationView {
    pub interpretation: AppliedInterpretation,
    pub rule: Option<Rule>,
}

/// Result of evaluating one sample without touching any store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub sample_id: Uuid,
    pub interpretations: Vec<NewInterpretation>,
    pub traces: Vec<RuleTrace>,
}
