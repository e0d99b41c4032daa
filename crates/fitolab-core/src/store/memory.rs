use crate::error::FitolabError;
use crate::model::{AppliedInterpretation, NewInterpretation, Sample};
use crate::rules::schema::{Rule, RuleDef, RuleFilter};
use crate::store::{Database, InterpretationStore, RuleRepository, SampleRepository};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// All three repositories over one in-process [`Database`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    db: Mutex<Database>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_database(db: Database) -> Self {
        MemoryStore { db: Mutex::new(db) }
    }

    pub fn put_sample(&self, sample: Sample) -> Result<(), FitolabError> {
        self.lock()?.upsert_sample(sample);
        Ok(())
    }

    /// Snapshot of the current state.
    pub fn snapshot(&self) -> Result<Database, FitolabError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>, FitolabError> {
        self.db
            .lock()
            .map_err(|_| FitolabError::Repository("memory store lock poisoned".into()))
    }
}

impl SampleRepository for MemoryStore {
    fn get_sample_with_results(&self, id: Uuid) -> Result<Option<Sample>, FitolabError> {
        Ok(self.lock()?.sample(id).cloned())
    }
}

impl RuleRepository for MemoryStore {
    fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<Rule>, FitolabError> {
        Ok(self.lock()?.list_rules(filter))
    }

    fn get_rule(&self, id: Uuid) -> Result<Option<Rule>, FitolabError> {
        Ok(self.lock()?.rule(id).cloned())
    }

    fn create_rule(&self, def: RuleDef) -> Result<Rule, FitolabError> {
        self.lock()?.create_rule(def)
    }

    fn deactivate_rule(&self, id: Uuid) -> Result<bool, FitolabError> {
        Ok(self.lock()?.deactivate_rule(id))
    }
}

impl InterpretationStore for MemoryStore {
    fn delete_for_sample(&self, sample_id: Uuid) -> Result<(), FitolabError> {
        self.lock()?.delete_interpretations(sample_id);
        Ok(())
    }

    fn insert(&self, new: NewInterpretation) -> Result<AppliedInterpretation, FitolabError> {
        Ok(self.lock()?.insert_interpretation(new))
    }

    fn list_for_sample(&self, sample_id: Uuid) -> Result<Vec<AppliedInterpretation>, FitolabError> {
        Ok(self.lock()?.interpretations_for(sample_id))
    }

    /// Delete and inserts happen under one lock acquisition.
    fn replace_for_sample(
        &self,
        sample_id: Uuid,
        new: Vec<NewInterpretation>,
    ) -> Result<Vec<AppliedInterpretation>, FitolabError> {
        self.lock()?.replace_interpretations(sample_id, new)
    }
}
