use serde::{Deserialize, Serialize};

/// One lexical correspondence found on a dictionary page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Headword in the output language, OCR-corrected
    pub source_term: String,

    /// Gloss in the source language, verbatim from the scan
    pub translated_term: String,

    /// 1-based page the entry was read from
    pub page_number: u32,
}

impl Entry {
    /// Build an entry from untrimmed terms.
    ///
    /// Returns `None` when either term is empty after trimming, so an
    /// `Entry` always carries two non-empty terms.
    pub fn new(source_term: &str, translated_term: &str, page_number: u32) -> Option<Self> {
        let source_term = source_term.trim();
        let translated_term = translated_term.trim();
        if source_term.is_empty() || translated_term.is_empty() {
            return None;
        }
        Some(Self {
            source_term: source_term.to_string(),
            translated_term: translated_term.to_string(),
            page_number,
        })
    }

    /// The pair used for deduplication
    pub fn key(&self) -> (&str, &str) {
        (&self.source_term, &self.translated_term)
    }
}
