/*!
 * Instruction template sent to the language model for every page.
 */

use crate::app_config::{Config, PromptExample};

/// Builds the per-page extraction instruction
#[derive(Debug, Clone)]
pub struct ExtractionPrompt {
    template: String,
    title: String,
    author: String,
    year: u16,
    output_language: String,
    source_language: String,
    output_key: String,
    source_key: String,
    examples: Vec<PromptExample>,
}

impl ExtractionPrompt {
    /// The default lexicographer instruction.
    pub const LEXICOGRAPHER: &'static str = r#"You are an expert linguist digitizing the {output_language}-{source_language} dictionary "{title}" by {author} ({year}).

STRICT INSTRUCTIONS:
1. Analyze the text of page {page_number} of a scanned dictionary.
2. Extract ONLY the lexical entries (a {output_language} term and its {source_language} translation).
3. CORRECT OCR errors in the {output_language} term but PRESERVE the {source_language} text exactly as scanned.
4. Entries usually follow the format "{output_language}_term. {source_language}_term".
5. When one term has several translations keep them together, separated by commas: "{output_language}_term. {source_language}_term1, {source_language}_term2".
6. Return ONLY a valid JSON array. No text before or after it.

OUTPUT FORMAT:
[
  {"{output_key}": "corrected term", "{source_key}": "original {source_language} text"},
  {"{output_key}": "another term", "{source_key}": "{source_language} text"}
]

EXAMPLES:
{examples}

PAGE TEXT:
```
{page_text}
```"#;

    /// Create the prompt builder for a configuration
    pub fn from_config(config: &Config) -> Self {
        let profile = &config.dictionary;
        Self {
            template: Self::LEXICOGRAPHER.to_string(),
            title: profile.title.clone(),
            author: profile.author.clone(),
            year: profile.year,
            output_language: config.output_language_name(),
            source_language: config.source_language_name(),
            output_key: profile.output_key.clone(),
            source_key: profile.source_key.clone(),
            examples: profile.examples.clone(),
        }
    }

    /// Replace the instruction template; same placeholders as [`Self::LEXICOGRAPHER`]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// JSON key of the output-language term
    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    /// JSON key of the source-language term
    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    fn render_examples(&self) -> String {
        if self.examples.is_empty() {
            return "(none)".to_string();
        }
        self.examples.iter()
            .map(|example| {
                format!(
                    "- \"{}\" ->\n  {{{}: {}, {}: {}}}",
                    example.scanned,
                    json_string(&self.output_key),
                    json_string(&example.output_term),
                    json_string(&self.source_key),
                    json_string(&example.source_term),
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render the instruction for one page
    pub fn render(&self, page_number: u32, page_text: &str) -> String {
        // page text last, so placeholders inside the scan are left alone
        self.template
            .replace("{output_language}", &self.output_language)
            .replace("{source_language}", &self.source_language)
            .replace("{title}", &self.title)
            .replace("{author}", &self.author)
            .replace("{year}", &self.year.to_string())
            .replace("{output_key}", &self.output_key)
            .replace("{source_key}", &self.source_key)
            .replace("{page_number}", &page_number.to_string())
            .replace("{examples}", &self.render_examples())
            .replace("{page_text}", page_text)
    }
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

impl Default for ExtractionPrompt {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
