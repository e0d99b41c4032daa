use crate::error::FitolabError;
use crate::model::{AppliedInterpretation, NewInterpretation, Sample};
use crate::rules::schema::{Rule, RuleDef, RuleFilter};
use crate::store::new_rule;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whole-database state shared by the in-memory and file-backed stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub interpretations: Vec<AppliedInterpretation>,
}

impl Database {
    pub fn sample(&self, id: Uuid) -> Option<&Sample> {
        self.samples.iter().find(|s| s.id == id)
    }

    /// Insert a sample, replacing any sample with the same id.
    pub fn upsert_sample(&mut self, sample: Sample) {
        match self.samples.iter_mut().find(|s| s.id == sample.id) {
            Some(existing) => *existing = sample,
            None => self.samples.push(sample),
        }
    }

    pub fn list_rules(&self, filter: &RuleFilter) -> Vec<Rule> {
        self.rules
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    pub fn rule(&self, id: Uuid) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn create_rule(&mut self, def: RuleDef) -> Result<Rule, FitolabError> {
        let rule = new_rule(def)?;
        self.rules.push(rule.clone());
        Ok(rule)
    }

    pub fn deactivate_rule(&mut self, id: Uuid) -> bool {
        match self.rules.iter_mut().find(|r| r.id == id) {
            Some(rule) => {
                rule.active = false;
                true
            }
            None => false,
        }
    }

    pub fn interpretations_for(&self, sample_id: Uuid) -> Vec<AppliedInterpretation> {
        self.interpretations
            .iter()
            .filter(|i| i.sample_id == sample_id)
            .cloned()
            .collect()
    }

    pub fn delete_interpretations(&mut self, sample_id: Uuid) {
        self.interpretations.retain(|i| i.sample_id != sample_id);
    }

    pub fn insert_interpretation(&mut self, new: NewInterpretation) -> AppliedInterpretation {
        let applied = AppliedInterpretation::from_new(new);
        self.interpretations.push(applied.clone());
        applied
    }

    pub fn replace_interpretations(
        &mut self,
        sample_id: Uuid,
        new: Vec<NewInterpretation>,
    ) -> Result<Vec<AppliedInterpretation>, FitolabError> {
        if let Some(stray) = new.iter().find(|n| n.sample_id != sample_id) {
            return Err(FitolabError::Repository(format!(
                "interpretation for sample {} cannot replace the set of sample {}",
                stray.sample_id, sample_id
            )));
        }
        self.delete_interpretations(sample_id);
        Ok(new
            .into_iter()
            .map(|n| self.insert_interpretation(n))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn draft(sample_id: Uuid, message: &str) -> NewInterpretation {
        NewInterpretation {
            sample_id,
            rule_id: Uuid::new_v4(),
            message: message.into(),
            severity: Severity::Low,
        }
    }

    #[test]
    fn test_replace_only_touches_one_sample() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut db = Database::default();
        db.insert_interpretation(draft(a, "old a"));
        db.insert_interpretation(draft(b, "old b"));

        let applied = db
            .replace_interpretations(a, vec![draft(a, "new a 1"), draft(a, "new a 2")])
            .unwrap();

        assert_eq!(applied.len(), 2);
        let messages: Vec<_> = db
            .interpretations_for(a)
            .into_iter()
            .map(|i| i.message)
            .collect();
        assert_eq!(messages, vec!["new a 1", "new a 2"]);
        assert_eq!(db.interpretations_for(b)[0].message, "old b");
    }

    #[test]
    fn test_replace_rejects_foreign_drafts_without_deleting() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut db = Database::default();
        db.insert_interpretation(draft(a, "old a"));

        assert!(db.replace_interpretations(a, vec![draft(b, "x")]).is_err());
        assert_eq!(db.interpretations_for(a).len(), 1);
    }

    #[test]
    fn test_deactivate_unknown_rule() {
        let mut db = Database::default();
        assert!(!db.deactivate_rule(Uuid::new_v4()));
    }
}
