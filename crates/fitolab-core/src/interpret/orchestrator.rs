use crate::error::FitolabError;
use crate::interpret::interpret_sample;
use crate::interpret::matcher::trace_rules;
use crate::interpret::outcome::{Evaluation, InterpretationView, RuleTrace};
use crate::model::{AppliedInterpretation, NewInterpretation, Sample};
use crate::rules::schema::Rule;
use crate::store::{InterpretationStore, RuleRepository, SampleRepository};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Advisory locks keyed on sample id.
///
/// Holding a sample's lock serializes evaluation passes for that sample so
/// two passes never interleave their replace steps. Entries are dropped as
/// soon as no caller holds or waits on them.
#[derive(Debug, Default)]
pub struct SampleLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SampleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide lock set used by [`Interpreter::new`].
    pub fn shared() -> Arc<SampleLocks> {
        static SHARED: OnceLock<Arc<SampleLocks>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(SampleLocks::new())))
    }

    /// Run `f` while holding the lock for `sample_id`.
    pub fn with_lock<T>(&self, sample_id: Uuid, f: impl FnOnce() -> T) -> T {
        let handle = {
            let mut locks = self.map();
            Arc::clone(locks.entry(sample_id).or_default())
        };
        let out = {
            // The guarded value is (), so a poisoned lock carries no bad state.
            let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(sample_id, handle);
        out
    }

    /// Number of samples currently locked or waited on.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, sample_id: Uuid, handle: Arc<Mutex<()>>) {
        let mut locks = self.map();
        drop(handle);
        // Handles are only cloned under the map lock, so a count of one
        // means the map holds the last reference.
        if locks
            .get(&sample_id)
            .is_some_and(|h| Arc::strong_count(h) == 1)
        {
            locks.remove(&sample_id);
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Public entry point of the interpretation engine.
pub struct Interpreter<'a> {
    samples: &'a dyn SampleRepository,
    rules: &'a dyn RuleRepository,
    interpretations: &'a dyn InterpretationStore,
    locks: Arc<SampleLocks>,
}

impl<'a> Interpreter<'a> {
    /// Interpreter using the process-wide [`SampleLocks::shared`] set, so
    /// separately built interpreters still serialize passes per sample.
    pub fn new(
        samples: &'a dyn SampleRepository,
        rules: &'a dyn RuleRepository,
        interpretations: &'a dyn InterpretationStore,
    ) -> Self {
        Self::with_locks(samples, rules, interpretations, SampleLocks::shared())
    }

    pub fn with_locks(
        samples: &'a dyn SampleRepository,
        rules: &'a dyn RuleRepository,
        interpretations: &'a dyn InterpretationStore,
        locks: Arc<SampleLocks>,
    ) -> Self {
        Interpreter {
            samples,
            rules,
            interpretations,
            locks,
        }
    }

    /// Evaluate all active rules against a sample and replace its stored
    /// interpretations with the result.
    ///
    /// `Ok(vec![])` means no rule matched. Repository failures are logged and
    /// returned as errors; in that case the previously stored set is kept.
    pub fn evaluate_and_apply(
        &self,
        sample_id: Uuid,
    ) -> Result<Vec<AppliedInterpretation>, FitolabError> {
        self.locks.with_lock(sample_id, || {
            let drafts = self.preview(sample_id)?;
            let applied = self
                .interpretations
                .replace_for_sample(sample_id, drafts)
                .inspect_err(|e| {
                    error!(%sample_id, error = %e, "failed to store interpretations")
                })?;
            info!(%sample_id, count = applied.len(), "interpretations applied");
            Ok(applied)
        })
    }

    /// Compute the interpretations a pass would store, without storing them.
    pub fn preview(&self, sample_id: Uuid) -> Result<Vec<NewInterpretation>, FitolabError> {
        let (sample, rules) = self.load(sample_id)?;
        Ok(interpret_sample(&sample, &rules))
    }

    /// Per-rule explanation of what a pass would do for this sample.
    pub fn explain(&self, sample_id: Uuid) -> Result<Vec<RuleTrace>, FitolabError> {
        let (sample, rules) = self.load(sample_id)?;
        Ok(trace_rules(&sample, &rules))
    }

    /// Drafts and per-rule traces from a single load of sample and rules.
    pub fn dry_run(&self, sample_id: Uuid) -> Result<Evaluation, FitolabError> {
        let (sample, rules) = self.load(sample_id)?;
        Ok(crate::evaluate(&sample, &rules))
    }

    /// Stored interpretations of a sample, each joined with its rule.
    pub fn list_with_rules(
        &self,
        sample_id: Uuid,
    ) -> Result<Vec<InterpretationView>, FitolabError> {
        let interpretations = self.interpretations.list_for_sample(sample_id)?;
        let mut rules: HashMap<Uuid, Option<Rule>> = HashMap::new();
        let mut views = Vec::with_capacity(interpretations.len());

        for interpretation in interpretations {
            let rule = match rules.get(&interpretation.rule_id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self.rules.get_rule(interpretation.rule_id)?;
                    if fetched.is_none() {
                        warn!(
                            %sample_id,
                            rule_id = %interpretation.rule_id,
                            "interpretation references an unknown rule"
                        );
                    }
                    rules.insert(interpretation.rule_id, fetched.clone());
                    fetched
                }
            };
            views.push(InterpretationView {
                interpretation,
                rule,
            });
        }

        Ok(views)
    }

    fn load(&self, sample_id: Uuid) -> Result<(Sample, Vec<Rule>), FitolabError> {
        let sample = self
            .samples
            .get_sample_with_results(sample_id)
            .inspect_err(|e| error!(%sample_id, error = %e, "failed to load sample"))?
            .ok_or_else(|| {
                error!(%sample_id, "sample not found");
                FitolabError::SampleNotFound(sample_id)
            })?;

        let rules = self
            .rules
            .list_active_rules()
            .inspect_err(|e| error!(%sample_id, error = %e, "failed to load active rules"))?;

        Ok((sample, rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_same_sample_is_serialized() {
        let locks = SampleLocks::new();
        let id = Uuid::new_v4();
        let inside = AtomicUsize::new(0);
        let max_seen = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    locks.with_lock(id, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                });
            }
        });

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_released_entries_are_removed() {
        let locks = SampleLocks::new();
        let id = Uuid::new_v4();

        locks.with_lock(id, || assert_eq!(locks.len(), 1));
        assert!(locks.is_empty());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| locks.with_lock(id, std::thread::yield_now));
            }
        });
        assert!(locks.is_empty());
    }

    #[test]
    fn test_shared_set_is_one_instance() {
        assert!(Arc::ptr_eq(&SampleLocks::shared(), &SampleLocks::shared()));
    }

    #[test]
    fn test_different_samples_do_not_share_a_lock() {
        let locks = SampleLocks::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        // Nested locking of a different sample must not deadlock.
        let value = locks.with_lock(a, || locks.with_lock(b, || 7));
        assert_eq!(value, 7);
    }
}
