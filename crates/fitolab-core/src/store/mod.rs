//! Repositories the interpretation engine reads from and writes to.
//!
//! The engine only talks to these traits. Two implementations are provided:
//! [`memory::MemoryStore`] for embedding and tests, and
//! [`json_file::JsonFileStore`] for a single-file database used by the CLI.

pub mod cache;
pub mod database;
mod file_lock;
pub mod json_file;
pub mod memory;

use crate::error::FitolabError;
use crate::model::{AppliedInterpretation, NewInterpretation, Sample};
use crate::rules::schema::{Rule, RuleDef, RuleFilter};
use uuid::Uuid;

pub use cache::CachedRuleRepository;
pub use database::Database;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

pub trait SampleRepository: Send + Sync {
    /// Fetch a sample with its units and results. `Ok(None)` if unknown.
    fn get_sample_with_results(&self, id: Uuid) -> Result<Option<Sample>, FitolabError>;
}

pub trait RuleRepository: Send + Sync {
    fn list_active_rules(&self) -> Result<Vec<Rule>, FitolabError> {
        self.list_rules(&RuleFilter::active())
    }

    fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<Rule>, FitolabError>;

    fn get_rule(&self, id: Uuid) -> Result<Option<Rule>, FitolabError>;

    /// Validate and store a new rule. A fresh id and timestamp are assigned.
    fn create_rule(&self, def: RuleDef) -> Result<Rule, FitolabError>;

    /// Mark a rule inactive. Returns false if no rule has this id.
    fn deactivate_rule(&self, id: Uuid) -> Result<bool, FitolabError>;
}

pub trait InterpretationStore: Send + Sync {
    fn delete_for_sample(&self, sample_id: Uuid) -> Result<(), FitolabError>;

    fn insert(&self, new: NewInterpretation) -> Result<AppliedInterpretation, FitolabError>;

    fn list_for_sample(&self, sample_id: Uuid) -> Result<Vec<AppliedInterpretation>, FitolabError>;

    /// Replace the whole interpretation set of a sample.
    ///
    /// The default runs delete and inserts as separate steps and is not
    /// atomic: a failing insert leaves a partial set. Stores that can
    /// group the steps override this.
    fn replace_for_sample(
        &self,
        sample_id: Uuid,
        new: Vec<NewInterpretation>,
    ) -> Result<Vec<AppliedInterpretation>, FitolabError> {
        self.delete_for_sample(sample_id)?;
        new.into_iter().map(|n| self.insert(n)).collect()
    }
}

/// Turn a rule definition into a freshly created rule.
pub(crate) fn new_rule(mut def: RuleDef) -> Result<Rule, FitolabError> {
    def.id = None;
    def.created_at = None;
    Rule::try_from(def)
}
