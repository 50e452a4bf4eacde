/*!
 * # Lexiscribe - dictionary digitization with AI
 *
 * A Rust library that turns scanned pages of a historical bilingual
 * dictionary into structured lexical entries, using a language model to read
 * each page, and exports them as CSV and XLSX tables.
 *
 * ## Features
 *
 * - Read page text from PDF files or `pdftotext` dumps
 * - Skip front matter and pages without entries
 * - Strip page numbers, running headers and boilerplate
 * - Extract entries with various AI providers:
 *   - Google Gemini API
 *   - Ollama (local LLM)
 *   - Anthropic API
 * - Deduplicate, sort and filter the results
 * - Resume interrupted runs from a checkpoint
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management and the dictionary profile
 * - `document`: Paged sources of raw text
 * - `extraction`: The per-page pipeline:
 *   - `extraction::page_filter`: Entry page detection
 *   - `extraction::text_cleaner`: Page text normalization
 *   - `extraction::extractor`: Model-backed entry extraction
 *   - `extraction::processor`: Sequential page loop
 * - `result_store`: Deduplication, sorting, filtering and statistics
 * - `export`: CSV and XLSX writers
 * - `checkpoint`: Resume points
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for the LLM providers
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod checkpoint;
pub mod document;
pub mod errors;
pub mod export;
pub mod extraction;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod result_store;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunReport};
pub use document::{Document, MemoryDocument, PdfDocument, TextDocument, open_document};
pub use extraction::{Entry, EntryExtractor, PageFilter, PageProcessor, PageRange, ProcessingResult, TextCleaner, TextToEntries};
pub use result_store::ResultStore;
pub use language_utils::{language_codes_match, normalize_to_part2t, get_language_name};
pub use errors::{DocumentError, ExportError, ExtractionError, ProviderError};
