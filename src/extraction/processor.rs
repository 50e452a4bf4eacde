/*!
 * Sequential page loop: load, filter, clean, extract, pace.
 *
 * No failure on a single page stops the loop. Load errors, unparseable
 * model answers and failed model calls are recorded in the result and the
 * loop moves on to the next page.
 */

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::app_config::Config;
use crate::document::Document;
use crate::errors::ExtractionError;
use crate::extraction::entry::Entry;
use crate::extraction::extractor::TextToEntries;
use crate::extraction::page_filter::PageFilter;
use crate::extraction::text_cleaner::TextCleaner;

/// Inclusive, 1-based page range clamped to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Clamp a requested range to a document of `page_count` pages.
    /// A missing end means the last page. The result may be empty.
    pub fn resolve(start: u32, end: Option<u32>, page_count: usize) -> Self {
        let last = u32::try_from(page_count).unwrap_or(u32::MAX);
        Self {
            start: start.max(1),
            end: end.unwrap_or(last).min(last),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of pages in the range
    pub fn len(&self) -> usize {
        if self.is_empty() { 0 } else { (self.end - self.start + 1) as usize }
    }

    pub fn pages(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Why a page failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageFailureKind {
    /// The document could not produce the page text
    Load,
    /// The model answer was not a JSON array
    Parse,
    /// The model call failed
    Model,
}

impl fmt::Display for PageFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Parse => "parse",
            Self::Model => "model",
        };
        f.write_str(name)
    }
}

/// Diagnostic record of a failed page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFailure {
    pub page_number: u32,
    pub kind: PageFailureKind,
    pub message: String,
    /// Raw model answer for parse failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl From<ExtractionError> for PageFailure {
    fn from(error: ExtractionError) -> Self {
        let page_number = error.page_number();
        match error {
            ExtractionError::InvalidJson { message, raw_response, .. } => Self {
                page_number,
                kind: PageFailureKind::Parse,
                message,
                raw_response: Some(raw_response),
            },
            ExtractionError::Model { source, .. } => Self {
                page_number,
                kind: PageFailureKind::Model,
                message: source.to_string(),
                raw_response: None,
            },
        }
    }
}

/// Reason a page was not sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The page filter rejected the raw text
    NotEntryPage,
    /// Nothing was left after cleaning
    EmptyAfterCleaning,
}

/// What happened to one page
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Entries were extracted
    Extracted(usize),
    /// The model answered with no usable entries
    NoEntries,
    /// The page was not sent to the model
    Skipped(SkipReason),
    /// The page failed
    Failed(PageFailureKind),
}

/// Accumulated outcome of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingResult {
    /// Entries in extraction order
    pub entries: Vec<Entry>,
    /// Pages that contributed at least one entry
    pub pages_processed: usize,
    /// Pages that failed to load or extract
    pub errored_pages: BTreeSet<u32>,
    /// Failure details, in page order
    pub failures: Vec<PageFailure>,
    /// Pages rejected by the filter or empty after cleaning
    pub pages_skipped: usize,
    /// Last page the loop reached
    pub last_page_visited: Option<u32>,
}

impl ProcessingResult {
    /// Start from the entries, failed pages and processed count of an earlier run
    pub fn resumed(entries: Vec<Entry>, errored_pages: impl IntoIterator<Item = u32>, pages_processed: usize) -> Self {
        Self {
            entries,
            pages_processed,
            errored_pages: errored_pages.into_iter().collect(),
            ..Self::default()
        }
    }

    fn record_failure(&mut self, failure: PageFailure) {
        self.errored_pages.insert(failure.page_number);
        self.failures.push(failure);
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let errored = if self.errored_pages.is_empty() {
            "none".to_string()
        } else {
            self.errored_pages.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
        };
        format!(
            "{} pages processed, {} entries, {} pages skipped, errored pages: {}",
            self.pages_processed,
            self.entries.len(),
            self.pages_skipped,
            errored
        )
    }
}

/// Runs filter, cleaner and extractor over a page range
pub struct PageProcessor<E: TextToEntries> {
    filter: PageFilter,
    cleaner: TextCleaner,
    extractor: E,
    pacing_delay: Duration,
}

impl<E: TextToEntries> PageProcessor<E> {
    pub fn new(filter: PageFilter, cleaner: TextCleaner, extractor: E, pacing_delay: Duration) -> Self {
        Self {
            filter,
            cleaner,
            extractor,
            pacing_delay,
        }
    }

    /// Build a processor from the dictionary profile and processing settings
    pub fn from_config(extractor: E, config: &Config) -> Self {
        Self::new(
            PageFilter::from_profile(&config.dictionary),
            TextCleaner::from_profile(&config.dictionary),
            extractor,
            Duration::from_millis(config.processing.pacing_delay_ms),
        )
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Process `range` of `document`
    pub async fn run(&self, document: &dyn Document, range: PageRange) -> ProcessingResult {
        self.run_with_observer(document, range, ProcessingResult::default(), |_, _, _| {}).await
    }

    /// Process `range` starting from `result`, calling `observer` after every page
    pub async fn run_with_observer<F>(
        &self,
        document: &dyn Document,
        range: PageRange,
        mut result: ProcessingResult,
        mut observer: F,
    ) -> ProcessingResult
    where
        F: FnMut(u32, &PageOutcome, &ProcessingResult),
    {
        if range.is_empty() {
            warn!("Page range {} is empty for {} ({} pages)", range, document.name(), document.page_count());
            return result;
        }

        info!("Processing pages {} of {}", range, document.name());

        for page_number in range.pages() {
            let outcome = self.process_page(document, page_number, &mut result).await;
            result.last_page_visited = Some(page_number);
            observer(page_number, &outcome, &result);

            // pause after every model call, but not after the last page
            let called_model = matches!(
                outcome,
                PageOutcome::Extracted(_) | PageOutcome::NoEntries
                    | PageOutcome::Failed(PageFailureKind::Parse | PageFailureKind::Model)
            );
            if called_model && page_number < range.end && !self.pacing_delay.is_zero() {
                tokio::time::sleep(self.pacing_delay).await;
            }
        }

        info!("Finished pages {}: {}", range, result.summary());
        result
    }

    async fn process_page(&self, document: &dyn Document, page_number: u32, result: &mut ProcessingResult) -> PageOutcome {
        let raw_text = match document.load_page_text((page_number - 1) as usize) {
            Ok(text) => text,
            Err(e) => {
                warn!("Page {}: could not load text: {}", page_number, e);
                result.record_failure(PageFailure {
                    page_number,
                    kind: PageFailureKind::Load,
                    message: e.to_string(),
                    raw_response: None,
                });
                return PageOutcome::Failed(PageFailureKind::Load);
            }
        };

        if !self.filter.is_entry_page(&raw_text) {
            debug!("Page {}: no dictionary entries detected, skipping", page_number);
            result.pages_skipped += 1;
            return PageOutcome::Skipped(SkipReason::NotEntryPage);
        }

        let cleaned = self.cleaner.clean(&raw_text);
        if cleaned.trim().is_empty() {
            debug!("Page {}: empty after cleaning, skipping", page_number);
            result.pages_skipped += 1;
            return PageOutcome::Skipped(SkipReason::EmptyAfterCleaning);
        }

        match self.extractor.extract(&cleaned, page_number).await {
            Ok(entries) if entries.is_empty() => {
                debug!("Page {}: no entries in model answer", page_number);
                PageOutcome::NoEntries
            }
            Ok(entries) => {
                let count = entries.len();
                debug!("Page {}: {} entries", page_number, count);
                result.entries.extend(entries);
                result.pages_processed += 1;
                PageOutcome::Extracted(count)
            }
            Err(e) => {
                let failure = PageFailure::from(e);
                let kind = failure.kind;
                result.record_failure(failure);
                PageOutcome::Failed(kind)
            }
        }
    }
}
