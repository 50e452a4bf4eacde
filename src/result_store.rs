/*!
 * Post-processing of accumulated entries before export.
 *
 * The store never mutates the entries it was built from; every view is a
 * new vector.
 */

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::extraction::Entry;

/// Entries with this many characters or fewer in the output-language term are noise
const MIN_SOURCE_TERM_CHARS: usize = 3;

/// Entries with this many characters or fewer in the source-language term are noise
const MIN_TRANSLATED_TERM_CHARS: usize = 2;

/// Aggregate numbers over a set of entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_entries: usize,
    pub distinct_pages: usize,
    pub average_per_page: f64,
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries from {} pages ({:.1} per page)",
            self.total_entries, self.distinct_pages, self.average_per_page
        )
    }
}

/// Read-only view over the entries of a run
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    entries: Vec<Entry>,
}

impl ResultStore {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop repeated `(source_term, translated_term)` pairs, keeping the first occurrence
    pub fn deduplicated(&self) -> Vec<Entry> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for entry in &self.entries {
            if seen.insert(entry.key()) {
                unique.push(entry.clone());
            }
        }
        unique
    }

    /// Entries stably sorted by page number
    pub fn by_page(&self) -> Vec<Entry> {
        let mut entries = self.entries.clone();
        entries.sort_by_key(|entry| entry.page_number);
        entries
    }

    /// Deduplicated, sorted by output-language term and stripped of noise
    pub fn refined(&self) -> Vec<Entry> {
        let mut entries = self.deduplicated();
        entries.sort_by(|a, b| a.source_term.cmp(&b.source_term));
        entries.retain(|entry| !is_noise(entry));
        entries
    }

    /// Totals over the stored entries
    pub fn statistics(&self) -> RunStatistics {
        let distinct_pages = self.entries.iter()
            .map(|entry| entry.page_number)
            .collect::<BTreeSet<_>>()
            .len();
        let average_per_page = if distinct_pages == 0 {
            0.0
        } else {
            self.entries.len() as f64 / distinct_pages as f64
        };

        RunStatistics {
            total_entries: self.entries.len(),
            distinct_pages,
            average_per_page,
        }
    }

    /// Up to `size` distinct entries picked at random, for a quick review
    pub fn sample(&self, size: usize) -> Vec<Entry> {
        self.entries
            .choose_multiple(&mut rand::rng(), size)
            .cloned()
            .collect()
    }

    /// Highest page number that produced an entry
    pub fn last_processed_page(&self) -> Option<u32> {
        self.entries.iter().map(|entry| entry.page_number).max()
    }
}

/// Whether an entry is too short to be a real headword and gloss
pub fn is_noise(entry: &Entry) -> bool {
    entry.source_term.chars().count() <= MIN_SOURCE_TERM_CHARS
        || entry.translated_term.chars().count() <= MIN_TRANSLATED_TERM_CHARS
}
