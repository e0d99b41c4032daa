use crate::error::FitolabError;
use crate::rules::schema::{Rule, RuleDef, RuleFilter};
use crate::store::RuleRepository;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Read-through cache of the active rule set.
///
/// Only `list_active_rules` is cached. Rule changes made through this
/// wrapper invalidate the cache; changes made behind its back are not seen
/// until [`CachedRuleRepository::invalidate`] is called.
#[derive(Debug)]
pub struct CachedRuleRepository<R> {
    inner: R,
    active: Mutex<Option<Vec<Rule>>>,
}

impl<R: RuleRepository> CachedRuleRepository<R> {
    pub fn new(inner: R) -> Self {
        CachedRuleRepository {
            inner,
            active: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn invalidate(&self) {
        *self.cache() = None;
    }

    // A panic mid-fill leaves at worst `None` or a complete list behind.
    fn cache(&self) -> MutexGuard<'_, Option<Vec<Rule>>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: RuleRepository> RuleRepository for CachedRuleRepository<R> {
    fn list_active_rules(&self) -> Result<Vec<Rule>, FitolabError> {
        let mut cached = self.cache();
        if let Some(ref rules) = *cached {
            return Ok(rules.clone());
        }
        let rules = self.inner.list_active_rules()?;
        debug!(count = rules.len(), "active rule cache filled");
        *cached = Some(rules.clone());
        Ok(rules)
    }

    fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<Rule>, FitolabError> {
        self.inner.list_rules(filter)
    }

    fn get_rule(&self, id: Uuid) -> Result<Option<Rule>, FitolabError> {
        self.inner.get_rule(id)
    }

    fn create_rule(&self, def: RuleDef) -> Result<Rule, FitolabError> {
        let result = self.inner.create_rule(def);
        self.invalidate();
        result
    }

    fn deactivate_rule(&self, id: Uuid) -> Result<bool, FitolabError> {
        let result = self.inner.deactivate_rule(id);
        self.invalidate();
        result
    }
}
