use crate::error::FitolabError;
use crate::interpret::template::MessageTemplate;
use crate::model::Severity;
use crate::rules::condition::Condition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored form of an interpretation rule.
///
/// The threshold is kept in its loose JSON shape here; its expected keys
/// depend on the comparator. Converting into [`Rule`] validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Only apply when some result in the sample was tested in this area.
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default, alias = "cropNext")]
    pub crop_next: Option<String>,
    /// Case-insensitive substring matched against result analyte names.
    pub analyte: String,
    pub comparator: String,
    #[serde(default)]
    pub threshold: serde_json::Value,
    pub message: String,
    pub severity: Severity,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// A validated rule with its threshold typed and its message compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleDef", into = "RuleDef")]
pub struct Rule {
    pub id: Uuid,
    pub area: Option<String>,
    pub species: Option<String>,
    pub crop_next: Option<String>,
    pub analyte: String,
    pub condition: Condition,
    pub message: MessageTemplate,
    pub severity: Severity,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RuleDef> for Rule {
    type Error = FitolabError;

    fn try_from(def: RuleDef) -> Result<Self, Self::Error> {
        // Matched as written; surrounding spaces are part of the pattern.
        let analyte = def.analyte.as_str();
        if analyte.trim().is_empty() {
            return Err(FitolabError::RuleInvalid(
                "analyte pattern must not be empty".into(),
            ));
        }
        if def.message.trim().is_empty() {
            return Err(FitolabError::RuleInvalid(format!(
                "rule for '{}' has an empty message",
                analyte
            )));
        }
        let condition = Condition::from_parts(&def.comparator, &def.threshold).map_err(|e| {
            FitolabError::RuleInvalid(format!("rule for '{}': {}", analyte, inner_reason(e)))
        })?;

        Ok(Rule {
            id: def.id.unwrap_or_else(Uuid::new_v4),
            area: non_empty(def.area),
            species: non_empty(def.species),
            crop_next: non_empty(def.crop_next),
            analyte: analyte.to_string(),
            condition,
            message: MessageTemplate::parse(&def.message),
            severity: def.severity,
            active: def.active,
            created_at: def.created_at.unwrap_or_else(Utc::now),
        })
    }
}

impl From<Rule> for RuleDef {
    fn from(rule: Rule) -> Self {
        RuleDef {
            id: Some(rule.id),
            area: rule.area,
            species: rule.species,
            crop_next: rule.crop_next,
            analyte: rule.analyte,
            comparator: rule.condition.comparator().symbol().to_string(),
            threshold: rule.condition.threshold_json(),
            message: rule.message.source().to_string(),
            severity: rule.severity,
            active: rule.active,
            created_at: Some(rule.created_at),
        }
    }
}

/// Blank filters are the same as no filter.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn inner_reason(e: FitolabError) -> String {
    match e {
        FitolabError::RuleInvalid(reason) => reason,
        other => other.to_string(),
    }
}

/// Criteria for listing rules from a rule repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFilter {
    pub area: Option<String>,
    pub active: Option<bool>,
}

impl RuleFilter {
    pub fn active() -> Self {
        RuleFilter {
            area: None,
            active: Some(true),
        }
    }

    pub fn matches(&self, rule: &Rule) -> bool {
        if let Some(ref area) = self.area {
            if rule.area.as_deref() != Some(area.as_str()) {
                return false;
            }
        }
        if let Some(active) = self.active {
            if rule.active != active {
                return false;
            }
        }
        true
    }
}
