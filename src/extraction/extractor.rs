/*!
 * Turns cleaned page text into entries by asking a language model.
 *
 * The model is expected to answer with a JSON array of objects carrying the
 * output-language and source-language keys of the dictionary profile.
 * Markdown code fences around the array are tolerated. Items that are not
 * objects, or that lack a usable string under either key, are dropped.
 */

use async_trait::async_trait;
use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::app_config::Config;
use crate::errors::ExtractionError;
use crate::extraction::entry::Entry;
use crate::extraction::prompts::ExtractionPrompt;
use crate::providers::LanguageModel;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z]*").expect("valid regex"));

/// Longest raw response excerpt written to the log
const LOG_PREVIEW_CHARS: usize = 300;

/// Something that reads entries out of one page of cleaned text
#[async_trait]
pub trait TextToEntries: Send + Sync {
    /// Extract the entries of a page. An `Err` means the page yields nothing.
    async fn extract(&self, cleaned_text: &str, page_number: u32) -> Result<Vec<Entry>, ExtractionError>;
}

/// Model-backed entry extractor
pub struct EntryExtractor<M: LanguageModel> {
    model: M,
    prompt: ExtractionPrompt,
}

impl<M: LanguageModel> EntryExtractor<M> {
    /// Create an extractor with an explicit prompt
    pub fn new(model: M, prompt: ExtractionPrompt) -> Self {
        Self { model, prompt }
    }

    /// Create an extractor for a configuration
    pub fn from_config(model: M, config: &Config) -> Self {
        Self::new(model, ExtractionPrompt::from_config(config))
    }

    /// The underlying model
    pub fn model(&self) -> &M {
        &self.model
    }
}

#[async_trait]
impl<M: LanguageModel> TextToEntries for EntryExtractor<M> {
    async fn extract(&self, cleaned_text: &str, page_number: u32) -> Result<Vec<Entry>, ExtractionError> {
        let prompt = self.prompt.render(page_number, cleaned_text);

        let response = self.model.generate(&prompt).await.map_err(|e| {
            error!("Page {}: {} call failed: {}", page_number, self.model.label(), e);
            ExtractionError::Model { page_number, source: e }
        })?;

        match parse_entries(&response, page_number, self.prompt.output_key(), self.prompt.source_key()) {
            Ok(entries) => {
                debug!("Page {}: {} entries extracted", page_number, entries.len());
                Ok(entries)
            }
            Err(e) => {
                error!("Page {}: could not parse model response: {}", page_number, e);
                warn!("Page {}: raw response: {}", page_number, preview(&response));
                Err(e)
            }
        }
    }
}

/// Remove Markdown code fences and surrounding whitespace
pub fn strip_code_fences(response: &str) -> String {
    CODE_FENCE.replace_all(response, "").trim().to_string()
}

/// Parse a model response into entries tagged with `page_number`
pub fn parse_entries(
    response: &str,
    page_number: u32,
    output_key: &str,
    source_key: &str,
) -> Result<Vec<Entry>, ExtractionError> {
    let cleaned = strip_code_fences(response);

    let invalid = |message: String| ExtractionError::InvalidJson {
        page_number,
        message,
        raw_response: response.to_string(),
    };

    let value: Value = serde_json::from_str(&cleaned).map_err(|e| invalid(e.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        other => return Err(invalid(format!("expected a JSON array, got {}", json_kind(&other)))),
    };

    let total = items.len();
    let entries: Vec<Entry> = items.iter()
        .filter_map(|item| {
            let object = item.as_object()?;
            let output_term = object.get(output_key)?.as_str()?;
            let source_term = object.get(source_key)?.as_str()?;
            Entry::new(output_term, source_term, page_number)
        })
        .collect();

    if entries.len() < total {
        debug!("Page {}: dropped {} of {} items without both terms", page_number, total - entries.len(), total);
    }

    Ok(entries)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= LOG_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    format!("{}...", cut)
}
