/*!
 * Normalization of raw page text before it is sent to the model.
 *
 * Every line is handled on its own: page numbers (standalone tokens of one to
 * three digits) are removed, whitespace runs are collapsed, then the line is
 * dropped if it is too short, purely numeric, or part of a running header.
 * Line boundaries survive, so the model still sees one entry per line.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::DictionaryProfile;

static PAGE_NUMBER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,3}\b").expect("valid regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Retained lines must be longer than this
const MIN_LINE_CHARS: usize = 5;

/// Strips page numbers, headers and boilerplate from page text
#[derive(Debug, Clone)]
pub struct TextCleaner {
    /// Lowercase words of running headers and footers
    boilerplate_words: Vec<String>,
}

impl TextCleaner {
    /// Create a cleaner that drops lines containing any of `boilerplate_words`
    pub fn new(boilerplate_words: Vec<String>) -> Self {
        Self {
            boilerplate_words: boilerplate_words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Create a cleaner for a dictionary profile
    pub fn from_profile(profile: &DictionaryProfile) -> Self {
        Self::new(profile.boilerplate_words.clone())
    }

    /// Clean raw page text. Applying it to its own output changes nothing.
    pub fn clean(&self, text: &str) -> String {
        text.split('\n')
            .filter_map(|line| self.clean_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Normalize one line, or `None` if it should be dropped
    pub fn clean_line(&self, line: &str) -> Option<String> {
        let without_numbers = PAGE_NUMBER_TOKEN.replace_all(line, "");
        let collapsed = WHITESPACE_RUN.replace_all(&without_numbers, " ");
        let line = collapsed.trim();

        if line.chars().count() <= MIN_LINE_CHARS {
            return None;
        }
        if line.chars().all(char::is_numeric) {
            return None;
        }
        let lower = line.to_lowercase();
        if self.boilerplate_words.iter().any(|word| lower.contains(word.as_str())) {
            return None;
        }
        Some(line.to_string())
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::from_profile(&DictionaryProfile::default())
    }
}
