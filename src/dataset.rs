use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const EMAILS_FILE: &str = "phishing_emails.json";
pub const SMS_FILE: &str = "phishing_sms.json";
pub const URLS_FILE: &str = "phishing_urls.json";

/// Label 1 marks a phishing sample, 0 a legitimate one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledText {
    pub text: String,
    pub label: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledUrl {
    pub url: String,
    pub label: u8,
}

impl LabeledText {
    pub fn is_phishing(&self) -> bool {
        self.label == 1
    }
}

impl LabeledUrl {
    pub fn is_phishing(&self) -> bool {
        self.label == 1
    }
}

/// In-memory copy of the three labeled corpora. Any of them may be empty.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub emails: Vec<LabeledText>,
    pub sms: Vec<LabeledText>,
    pub urls: Vec<LabeledUrl>,
}

impl Corpus {
    /// Lowercased texts of every phishing e-mail and SMS sample
    pub fn phishing_texts(&self) -> Vec<String> {
        self.emails
            .iter()
            .chain(self.sms.iter())
            .filter(|item| item.is_phishing())
            .map(|item| item.text.to_lowercase())
            .collect()
    }

    pub fn stats(&self) -> DatasetStats {
        let emails = SplitCount::from_labels(self.emails.iter().map(|e| e.label));
        let sms = SplitCount::from_labels(self.sms.iter().map(|s| s.label));
        let urls = SplitCount::from_labels(self.urls.iter().map(|u| u.label));

        DatasetStats {
            total_samples: emails.total + sms.total + urls.total,
            emails,
            sms,
            urls,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCount {
    pub total: usize,
    pub phishing: usize,
    pub legitimate: usize,
}

impl SplitCount {
    fn from_labels(labels: impl Iterator<Item = u8>) -> Self {
        let mut count = SplitCount::default();
        for label in labels {
            count.total += 1;
            match label {
                1 => count.phishing += 1,
                0 => count.legitimate += 1,
                _ => {}
            }
        }
        count
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_samples: usize,
    pub emails: SplitCount,
    pub sms: SplitCount,
    pub urls: SplitCount,
}

pub struct DatasetLoader {
    data_dir: PathBuf,
}

impl DatasetLoader {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load_emails(&self) -> Result<Vec<LabeledText>> {
        self.read_json(EMAILS_FILE)
    }

    pub fn load_sms(&self) -> Result<Vec<LabeledText>> {
        self.read_json(SMS_FILE)
    }

    pub fn load_urls(&self) -> Result<Vec<LabeledUrl>> {
        self.read_json(URLS_FILE)
    }

    /// Load every corpus, treating a missing or unreadable file as empty.
    pub fn load(&self) -> Corpus {
        let corpus = Corpus {
            emails: self.load_emails().unwrap_or_else(|e| Self::degrade(EMAILS_FILE, e)),
            sms: self.load_sms().unwrap_or_else(|e| Self::degrade(SMS_FILE, e)),
            urls: self.load_urls().unwrap_or_else(|e| Self::degrade(URLS_FILE, e)),
        };

        log::info!(
            "Loaded datasets from {}: {} emails, {} sms, {} urls",
            self.data_dir.display(),
            corpus.emails.len(),
            corpus.sms.len(),
            corpus.urls.len()
        );

        corpus
    }

    fn degrade<T>(file: &str, error: anyhow::Error) -> Vec<T> {
        log::warn!("Dataset {} unavailable, using empty corpus: {:#}", file, error);
        Vec::new()
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.data_dir.join(file);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dataset: {}", path.display()))
    }
}
