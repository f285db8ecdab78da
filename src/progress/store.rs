use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use super::{ProgressRecord, ProgressStore};

/// Process-local store; records vanish with the process.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    records: RwLock<HashMap<String, ProgressRecord>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for InMemoryProgressStore {
    fn get(&self, user_id: &str) -> Result<Option<ProgressRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("progress store lock poisoned"))?;
        Ok(records.get(user_id).cloned())
    }

    fn put(&self, user_id: &str, record: ProgressRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("progress store lock poisoned"))?;
        records.insert(user_id.to_string(), record);
        Ok(())
    }
}

/// All users in one JSON document, rewritten atomically on every put.
#[derive(Debug)]
pub struct JsonFileProgressStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, ProgressRecord>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read progress file at {:?}", self.path))?;
        if text.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&text)
            .with_context(|| format!("invalid progress file at {:?}", self.path))
    }

    fn save(&self, records: &HashMap<String, ProgressRecord>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create progress directory {:?}", dir))?;
        let mut staged = tempfile::NamedTempFile::new_in(&dir)
            .context("failed to stage progress file")?;
        serde_json::to_writer_pretty(&mut staged, records)
            .context("failed to serialize progress records")?;
        staged.flush().context("failed to flush progress file")?;
        staged
            .persist(&self.path)
            .with_context(|| format!("failed to replace progress file at {:?}", self.path))?;
        debug!(path = ?self.path, users = records.len(), "progress file written");
        Ok(())
    }
}

impl ProgressStore for JsonFileProgressStore {
    fn get(&self, user_id: &str) -> Result<Option<ProgressRecord>> {
        let _guard = self
            .lock
            .read()
            .map_err(|_| anyhow!("progress file lock poisoned"))?;
        Ok(self.load()?.remove(user_id))
    }

    fn put(&self, user_id: &str, record: ProgressRecord) -> Result<()> {
        let _guard = self
            .lock
            .write()
            .map_err(|_| anyhow!("progress file lock poisoned"))?;
        let mut records = self.load()?;
        records.insert(user_id.to_string(), record);
        self.save(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CompletedExercise, ProgressTracker};
    use chrono::NaiveDate;

    #[test]
    fn json_store_round_trips_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let tracker = ProgressTracker::new(JsonFileProgressStore::new(&path));
        tracker
            .record_exercise("ana", CompletedExercise::new("word", 88.0), today)
            .unwrap();

        let reopened = JsonFileProgressStore::new(&path);
        let record = reopened.get("ana").unwrap().unwrap();
        assert_eq!(record.exercises_completed, 1);
        assert_eq!(record.last_exercise_date, Some(today));
        assert!(reopened.get("someone-else").unwrap().is_none());
    }

    #[test]
    fn in_memory_store_keeps_users_apart() {
        let store = InMemoryProgressStore::new();
        store.put("a", ProgressRecord::default()).unwrap();
        assert!(store.get("a").unwrap().is_some());
        assert!(store.get("b").unwrap().is_none());
    }
}
