/*!
 * Dictionary page extraction.
 *
 * This module contains the per-page pipeline:
 * - `page_filter`: Detects pages that hold dictionary entries
 * - `text_cleaner`: Strips page numbers, headers and boilerplate
 * - `prompts`: Instruction sent to the language model
 * - `extractor`: Parses the model answer into entries
 * - `processor`: Runs the pipeline over a page range
 */

pub mod entry;
pub mod extractor;
pub mod page_filter;
pub mod processor;
pub mod prompts;
pub mod text_cleaner;

pub use entry::Entry;
pub use extractor::{EntryExtractor, TextToEntries, parse_entries, strip_code_fences};
pub use page_filter::PageFilter;
pub use processor::{PageFailure, PageFailureKind, PageOutcome, PageProcessor, PageRange, ProcessingResult, SkipReason};
pub use prompts::ExtractionPrompt;
pub use text_cleaner::TextCleaner;
