use crate::error::FitolabError;
use crate::model::{AppliedInterpretation, NewInterpretation, Sample};
use crate::rules::schema::{Rule, RuleDef, RuleFilter};
use crate::store::file_lock::FileLock;
use crate::store::{Database, InterpretationStore, RuleRepository, SampleRepository};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// All three repositories over a single JSON database file.
///
/// Every mutation holds an exclusive lock on `<path>.lock`, re-reads the
/// file, applies the change and writes the full database to a temporary
/// file in the same directory that is then renamed over the original.
/// Several handles, in one process or many, can share a file without
/// losing each other's writes. A failed mutation leaves the file and the
/// in-memory copy as they were.
///
/// Reads are served from the copy taken at `open` or at the last commit
/// through this handle.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    db: Mutex<Database>,
}

impl JsonFileStore {
    /// Open a database file. A missing file is an empty database.
    pub fn open(path: &Path) -> Result<Self, FitolabError> {
        Ok(JsonFileStore {
            path: path.to_path_buf(),
            db: Mutex::new(read_database(path)?),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn put_sample(&self, sample: Sample) -> Result<(), FitolabError> {
        self.commit(|db| {
            db.upsert_sample(sample);
            Ok(())
        })
    }

    pub fn samples(&self) -> Result<Vec<Sample>, FitolabError> {
        Ok(self.lock()?.samples.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>, FitolabError> {
        self.db
            .lock()
            .map_err(|_| FitolabError::Repository("database lock poisoned".into()))
    }

    /// Under the file lock: reload from disk, mutate, persist, publish.
    fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut Database) -> Result<T, FitolabError>,
    ) -> Result<T, FitolabError> {
        let _file_lock = FileLock::acquire(&FileLock::path_for(&self.path))?;
        let mut guard = self.lock()?;
        let mut next = read_database(&self.path)?;
        let out = mutate(&mut next)?;
        self.write(&next)?;
        *guard = next;
        Ok(out)
    }

    fn write(&self, db: &Database) -> Result<(), FitolabError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let fail = |e: &dyn std::fmt::Display| {
            FitolabError::Repository(format!("failed to write {}: {}", self.path.display(), e))
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| fail(&e))?;
        serde_json::to_writer_pretty(&mut tmp, db).map_err(|e| fail(&e))?;
        tmp.write_all(b"\n").map_err(|e| fail(&e))?;
        tmp.as_file().sync_all().map_err(|e| fail(&e))?;
        tmp.persist(&self.path).map_err(|e| fail(&e.error))?;
        Ok(())
    }
}

fn read_database(path: &Path) -> Result<Database, FitolabError> {
    if !path.exists() {
        debug!(path = %path.display(), "database file missing, starting empty");
        return Ok(Database::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        FitolabError::Repository(format!("failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        FitolabError::Repository(format!("corrupt database {}: {}", path.display(), e))
    })
}

impl SampleRepository for JsonFileStore {
    fn get_sample_with_results(&self, id: Uuid) -> Result<Option<Sample>, FitolabError> {
        Ok(self.lock()?.sample(id).cloned())
    }
}

impl RuleRepository for JsonFileStore {
    fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<Rule>, FitolabError> {
        Ok(self.lock()?.list_rules(filter))
    }

    fn get_rule(&self, id: Uuid) -> Result<Option<Rule>, FitolabError> {
        Ok(self.lock()?.rule(id).cloned())
    }

    fn create_rule(&self, def: RuleDef) -> Result<Rule, FitolabError> {
        self.commit(|db| db.create_rule(def))
    }

    fn deactivate_rule(&self, id: Uuid) -> Result<bool, FitolabError> {
        self.commit(|db| Ok(db.deactivate_rule(id)))
    }
}

impl InterpretationStore for JsonFileStore {
    fn delete_for_sample(&self, sample_id: Uuid) -> Result<(), FitolabError> {
        self.commit(|db| {
            db.delete_interpretations(sample_id);
            Ok(())
        })
    }

    fn insert(&self, new: NewInterpretation) -> Result<AppliedInterpretation, FitolabError> {
        self.commit(|db| Ok(db.insert_interpretation(new)))
    }

    fn list_for_sample(&self, sample_id: Uuid) -> Result<Vec<AppliedInterpretation>, FitolabError> {
        Ok(self.lock()?.interpretations_for(sample_id))
    }

    /// One file write covers the delete and all inserts.
    fn replace_for_sample(
        &self,
        sample_id: Uuid,
        new: Vec<NewInterpretation>,
    ) -> Result<Vec<AppliedInterpretation>, FitolabError> {
        self.commit(|db| db.replace_interpretations(sample_id, new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalyteResult, SampleUnit, Severity};
    use serde_json::json;

    fn rule_def() -> RuleDef {
        serde_json::from_value(json!({
            "area": "virologia",
            "analyte": "TSWV",
            "comparator": "=",
            "threshold": { "flag": "positivo" },
            "message": "{analyte} positivo en {unit_code}",
            "severity": "high"
        }))
        .unwrap()
    }

    fn sample() -> Sample {
        Sample {
            id: Uuid::new_v4(),
            code: Some("M-1".into()),
            species: Some("Pimiento".into()),
            variety: None,
            next_crop: None,
            units: vec![SampleUnit {
                code: Some("U1".into()),
                label: None,
                results: vec![AnalyteResult {
                    analyte: "TSWV".into(),
                    result_value: None,
                    result_flag: Some("positivo".into()),
                    test_area: Some("virologia".into()),
                }],
            }],
        }
    }

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(&dir.path().join("db.json")).unwrap();
        assert!(store.list_rules(&RuleFilter::default()).unwrap().is_empty());
        assert!(!dir.path().join("db.json").exists());
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let s = sample();

        let rule_id = {
            let store = JsonFileStore::open(&path).unwrap();
            store.put_sample(s.clone()).unwrap();
            let rule = store.create_rule(rule_def()).unwrap();
            store
                .insert(NewInterpretation {
                    sample_id: s.id,
                    rule_id: rule.id,
                    message: "TSWV positivo en U1".into(),
                    severity: Severity::High,
                })
                .unwrap();
            rule.id
        };

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get_sample_with_results(s.id).unwrap(), Some(s.clone()));
        let rule = store.get_rule(rule_id).unwrap().unwrap();
        assert_eq!(rule.message.source(), "{analyte} positivo en {unit_code}");
        assert_eq!(store.list_for_sample(s.id).unwrap().len(), 1);
    }

    #[test]
    fn test_deactivate_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let store = JsonFileStore::open(&path).unwrap();
        let rule = store.create_rule(rule_def()).unwrap();

        assert!(store.deactivate_rule(rule.id).unwrap());
        assert!(!store.deactivate_rule(Uuid::new_v4()).unwrap());

        let reopened = JsonFileStore::open(&path).unwrap();
        assert!(reopened.list_active_rules().unwrap().is_empty());
        assert_eq!(reopened.list_rules(&RuleFilter::default()).unwrap().len(), 1);
    }

    fn draft(sample_id: Uuid, message: &str) -> NewInterpretation {
        NewInterpretation {
            sample_id,
            rule_id: Uuid::new_v4(),
            message: message.into(),
            severity: Severity::Moderate,
        }
    }

    fn stored_messages(store: &JsonFileStore, sample_id: Uuid) -> Vec<String> {
        let mut out: Vec<String> = store
            .list_for_sample(sample_id)
            .unwrap()
            .into_iter()
            .map(|a| a.message)
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_replace_for_sample_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let s = sample();
        let other = Uuid::new_v4();

        let store = JsonFileStore::open(&path).unwrap();
        store.put_sample(s.clone()).unwrap();
        store.insert(draft(s.id, "old")).unwrap();
        store.insert(draft(other, "other sample")).unwrap();

        let applied = store
            .replace_for_sample(s.id, vec![draft(s.id, "new 1"), draft(s.id, "new 2")])
            .unwrap();
        assert_eq!(applied.len(), 2);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(stored_messages(&reopened, s.id), vec!["new 1", "new 2"]);
        assert_eq!(stored_messages(&reopened, other), vec!["other sample"]);
    }

    #[test]
    fn test_rejected_replace_keeps_previous_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let s = sample();

        let store = JsonFileStore::open(&path).unwrap();
        store.insert(draft(s.id, "previous")).unwrap();

        let err = store
            .replace_for_sample(s.id, vec![draft(s.id, "new"), draft(Uuid::new_v4(), "foreign")])
            .unwrap_err();
        assert!(err.is_repository());

        assert_eq!(stored_messages(&store, s.id), vec!["previous"]);
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(stored_messages(&reopened, s.id), vec!["previous"]);
    }

    #[test]
    fn test_failed_commit_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let s = sample();

        let store = JsonFileStore::open(&path).unwrap();
        store.insert(draft(s.id, "previous")).unwrap();

        // The database file can no longer be read back.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.replace_for_sample(s.id, vec![draft(s.id, "new")]).is_err());
        assert_eq!(stored_messages(&store, s.id), vec!["previous"]);
    }

    #[test]
    fn test_two_handles_keep_each_others_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let first = JsonFileStore::open(&path).unwrap();
        let second = JsonFileStore::open(&path).unwrap();
        first.replace_for_sample(a, vec![draft(a, "from first")]).unwrap();
        second.replace_for_sample(b, vec![draft(b, "from second")]).unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(stored_messages(&reopened, a), vec!["from first"]);
        assert_eq!(stored_messages(&reopened, b), vec!["from second"]);
    }

    #[test]
    fn test_concurrent_handles_do_not_lose_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let ids: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();

        std::thread::scope(|scope| {
            for id in &ids {
                let path = &path;
                scope.spawn(move || {
                    let store = JsonFileStore::open(path).unwrap();
                    store.replace_for_sample(*id, vec![draft(*id, "pass")]).unwrap();
                });
            }
        });

        let reopened = JsonFileStore::open(&path).unwrap();
        for id in &ids {
            assert_eq!(stored_messages(&reopened, *id), vec!["pass"]);
        }
    }

    #[test]
    fn test_corrupt_file_is_repository_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(err.is_repository());
    }
}
