/*!
 * Heuristic detection of pages that hold dictionary entries.
 *
 * Entry pages are dense with short "Term. gloss" lines; title pages,
 * dedications and page-number-only scans are not. False positives and
 * negatives are expected: a rejected page is simply not sent to the model.
 */

use crate::app_config::DictionaryProfile;

/// Minimum trimmed length of a line that can be an entry line
const ENTRY_LINE_MIN_CHARS: usize = 10;

/// Separator between headword and gloss
const ENTRY_DELIMITER: &str = ". ";

/// Lines starting with these are markup or annotations
const SKIPPED_LINE_PREFIXES: &[&str] = &["&", "*", "#", "//"];

/// Lines mentioning these are page or folio references
const PAGE_REFERENCE_WORDS: &[&str] = &["página", "pág", "folio"];

/// Decides whether a page's raw text is worth sending to the model
#[derive(Debug, Clone)]
pub struct PageFilter {
    /// Lowercase front-matter markers
    front_matter_markers: Vec<String>,
    /// Pages with fewer trimmed characters are rejected
    min_page_chars: usize,
    /// More entry lines than this are required
    entry_line_threshold: usize,
}

impl PageFilter {
    /// Create a filter with explicit settings
    pub fn new(front_matter_markers: Vec<String>, min_page_chars: usize, entry_line_threshold: usize) -> Self {
        Self {
            front_matter_markers: front_matter_markers.into_iter().map(|m| m.to_lowercase()).collect(),
            min_page_chars,
            entry_line_threshold,
        }
    }

    /// Create a filter for a dictionary profile
    pub fn from_profile(profile: &DictionaryProfile) -> Self {
        Self::new(
            profile.front_matter_markers.clone(),
            profile.min_page_chars,
            profile.entry_line_threshold,
        )
    }

    /// Whether the raw page text likely contains dictionary entries
    pub fn is_entry_page(&self, text: &str) -> bool {
        if text.trim().chars().count() < self.min_page_chars {
            return false;
        }

        if self.front_matter_marker(text).is_some() {
            return false;
        }

        self.entry_line_count(text) > self.entry_line_threshold
    }

    /// The first front-matter marker found in the text, if any
    pub fn front_matter_marker(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.front_matter_markers.iter()
            .find(|marker| lower.contains(marker.as_str()))
            .map(String::as_str)
    }

    /// Number of lines shaped like "Term. gloss"
    pub fn entry_line_count(&self, text: &str) -> usize {
        text.split('\n').filter(|line| is_entry_line(line)).count()
    }
}

impl Default for PageFilter {
    fn default() -> Self {
        Self::from_profile(&DictionaryProfile::default())
    }
}

/// Whether a single line looks like a dictionary entry
pub fn is_entry_line(line: &str) -> bool {
    let line = line.trim();
    if line.chars().count() <= ENTRY_LINE_MIN_CHARS || !line.contains(ENTRY_DELIMITER) {
        return false;
    }
    if SKIPPED_LINE_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) {
        return false;
    }
    let lower = line.to_lowercase();
    !PAGE_REFERENCE_WORDS.iter().any(|word| lower.contains(word))
}
