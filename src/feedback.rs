use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

const RECENT_LIMIT: usize = 5;

/// Minimal persistence capability the feedback layer depends on.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn put(&self, key: &str, value: Value) -> Result<()>;
    /// Every entry, ordered by key
    fn list(&self) -> Result<Vec<(String, Value)>>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().map_err(|_| anyhow!("Store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("Store lock poisoned"))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn list(&self) -> Result<Vec<(String, Value)>> {
        let entries = self.entries.lock().map_err(|_| anyhow!("Store lock poisoned"))?;
        Ok(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Whole-file JSON object on disk. A missing file reads as empty; it is
/// created on the first write.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read feedback file: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse feedback file: {}", self.path.display()))
    }

    fn write_all(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create feedback directory: {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(entries).context("Failed to serialize feedback")?;

        // Write beside the target, then rename over it
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, json)
            .with_context(|| format!("Failed to write feedback file: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to move {} over {}",
                tmp_path.display(),
                self.path.display()
            )
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("Store lock poisoned"))?;
        Ok(self.read_all()?.remove(key))
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("Store lock poisoned"))?;
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }

    fn list(&self) -> Result<Vec<(String, Value)>> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("Store lock poisoned"))?;
        Ok(self.read_all()?.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserJudgment {
    Correct,
    Incorrect,
    FalsePositive,
    FalseNegative,
}

impl FromStr for UserJudgment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "correct" => Ok(UserJudgment::Correct),
            "incorrect" => Ok(UserJudgment::Incorrect),
            "false_positive" => Ok(UserJudgment::FalsePositive),
            "false_negative" => Ok(UserJudgment::FalseNegative),
            other => bail!(
                "Unknown judgment '{}' (expected correct, incorrect, false_positive or false_negative)",
                other
            ),
        }
    }
}

/// What a caller submits about one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub analysis_type: String,
    pub input_data: String,
    pub predicted_result: Value,
    pub user_feedback: UserJudgment,
    pub actual_result: Option<bool>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: String,
    #[serde(flatten)]
    pub submission: FeedbackSubmission,
    pub correct_prediction: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total_feedback: usize,
    pub correct_predictions: usize,
    pub accuracy: f64,
    pub recent_feedback: Vec<FeedbackRecord>,
}

pub struct FeedbackStore {
    store: Box<dyn KeyValueStore>,
    /// Held from id allocation until the record is stored
    append_lock: Mutex<()>,
}

impl FeedbackStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            append_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    pub fn json_file<P: AsRef<Path>>(path: P) -> Self {
        Self::new(Box::new(JsonFileStore::new(path)))
    }

    /// Persist one submission and return its id
    pub fn record(&self, submission: FeedbackSubmission) -> Result<String> {
        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| anyhow!("Feedback lock poisoned"))?;

        let next = self.store.list()?.len() + 1;
        let id = format!("feedback-{:06}", next);
        if self.store.get(&id)?.is_some() {
            bail!("Feedback id {} is already taken", id);
        }

        let record = FeedbackRecord {
            id: id.clone(),
            correct_prediction: submission.user_feedback == UserJudgment::Correct,
            submission,
            timestamp: Utc::now(),
        };

        let value = serde_json::to_value(&record).context("Failed to encode feedback record")?;
        self.store.put(&id, value)?;

        log::info!(
            "Recorded {} ({:?} on {} analysis)",
            id,
            record.submission.user_feedback,
            record.submission.analysis_type
        );
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<Option<FeedbackRecord>> {
        match self.store.get(id)? {
            Some(value) => Ok(Some(
                serde_json::from_value(value)
                    .with_context(|| format!("Malformed feedback record: {}", id))?,
            )),
            None => Ok(None),
        }
    }

    /// Every record in insertion order
    pub fn all(&self) -> Result<Vec<FeedbackRecord>> {
        self.store
            .list()?
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_value(value)
                    .with_context(|| format!("Malformed feedback record: {}", key))
            })
            .collect()
    }

    pub fn stats(&self) -> Result<FeedbackStats> {
        let records = self.all()?;
        let total_feedback = records.len();
        let correct_predictions = records.iter().filter(|r| r.correct_prediction).count();
        let accuracy = if total_feedback > 0 {
            correct_predictions as f64 / total_feedback as f64
        } else {
            0.0
        };
        let recent_feedback = records[total_feedback.saturating_sub(RECENT_LIMIT)..].to_vec();

        Ok(FeedbackStats {
            total_feedback,
            correct_predictions,
            accuracy,
            recent_feedback,
        })
    }
}
