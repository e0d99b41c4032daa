use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
        })
    }
}

/// A single measured result within an analytical unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyteResult {
    /// Free-text name of the measured organism or entity.
    pub analyte: String,
    #[serde(default)]
    pub result_value: Option<Decimal>,
    #[serde(default)]
    pub result_flag: Option<String>,
    /// Diagnostic discipline the test belongs to (e.g. "nematologia").
    #[serde(default)]
    pub test_area: Option<String>,
}

/// An analytical unit of a sample (a plot, a plant, a subsample).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleUnit {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub results: Vec<AnalyteResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: Uuid,
    /// Laboratory sample code as printed on reports.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub variety: Option<String>,
    #[serde(default)]
    pub next_crop: Option<String>,
    #[serde(default)]
    pub units: Vec<SampleUnit>,
}

impl Sample {
    /// Iterate every result of every unit, in unit order.
    pub fn results(&self) -> impl Iterator<Item = (&SampleUnit, &AnalyteResult)> {
        self.units
            .iter()
            .flat_map(|unit| unit.results.iter().map(move |result| (unit, result)))
    }

    /// True if any result in the sample was tested in `area`.
    pub fn has_test_area(&self, area: &str) -> bool {
        self.results()
            .any(|(_, r)| r.test_area.as_deref() == Some(area))
    }
}

/// An interpretation ready to be persisted (no identity yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInterpretation {
    pub sample_id: Uuid,
    pub rule_id: Uuid,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedInterpretation {
    pub id: Uuid,
    pub sample_id: Uuid,
    /// Lookup-only reference to the rule that produced this row.
    pub rule_id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl AppliedInterpretation {
    /// Assign identity and timestamp to a draft.
    pub fn from_new(new: NewInterpretation) -> Self {
        AppliedInterpretation {
            id: Uuid::new_v4(),
            sample_id: new.sample_id,
            rule_id: new.rule_id,
            message: new.message,
            severity: new.severity,
            created_at: Utc::now(),
        }
    }

    /// The content that is stable across re-evaluation passes.
    pub fn content(&self) -> (Uuid, &str, Severity) {
        (self.rule_id, self.message.as_str(), self.severity)
    }
}
