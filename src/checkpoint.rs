/*!
 * Resume point of a run, persisted next to the exports.
 */

use anyhow::{Result, Context};
use chrono::{DateTime, Local};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::extraction::Entry;
use crate::file_utils::FileManager;

/// Saved progress of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Document name
    pub document: String,

    /// SHA-256 of the document file, when it came from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Highest page that produced entries
    pub last_processed_page: Option<u32>,

    /// Page the next run should start from
    pub next_start_page: u32,

    /// Pages in the document
    pub total_pages: usize,

    /// Pages that failed so far, including those of resumed runs
    #[serde(default)]
    pub errored_pages: Vec<u32>,

    /// Pages that produced entries so far
    #[serde(default)]
    pub pages_processed: usize,

    /// Every entry extracted so far
    pub entries: Vec<Entry>,

    pub created_at: DateTime<Local>,
}

impl Checkpoint {
    /// Whether every page of the document has been visited
    pub fn is_complete(&self) -> bool {
        self.next_start_page as usize > self.total_pages
    }

    /// Write the checkpoint as pretty JSON, replacing any previous one
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(self)
            .context("Failed to serialize checkpoint")?;
        FileManager::write_atomically(path, &json)
            .with_context(|| format!("Failed to save checkpoint: {:?}", path))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse checkpoint: {:?}", path))
    }

    /// Load a checkpoint if one exists at `path`
    pub fn load_if_exists<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        if !FileManager::file_exists(&path) {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Whether this checkpoint was written for the given document.
    /// A missing fingerprint on either side only compares names.
    pub fn matches(&self, document: &str, fingerprint: Option<&str>) -> bool {
        if self.document != document {
            warn!("Checkpoint belongs to '{}', not '{}'", self.document, document);
            return false;
        }
        match (self.fingerprint.as_deref(), fingerprint) {
            (Some(saved), Some(current)) if saved != current => {
                warn!("'{}' changed since the checkpoint was written", document);
                false
            }
            _ => true,
        }
    }
}
