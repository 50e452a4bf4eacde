use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Dictionary being digitized
    #[serde(default)]
    pub dictionary: DictionaryProfile,

    /// Extraction (language model) config
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Page loop settings
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Output files
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Everything that is specific to one scanned dictionary: how it names itself,
/// which words mark its front matter, and how its columns are called.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DictionaryProfile {
    /// Title used in the model instruction
    #[serde(default = "default_title")]
    pub title: String,

    /// Compiler of the dictionary
    #[serde(default = "default_author")]
    pub author: String,

    /// Publication year
    #[serde(default = "default_year")]
    pub year: u16,

    /// Language of the glosses kept verbatim (ISO code)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language of the headwords that get OCR-corrected (ISO code)
    #[serde(default = "default_output_language")]
    pub output_language: String,

    /// JSON key the model uses for the output-language term
    #[serde(default = "default_output_key")]
    pub output_key: String,

    /// JSON key the model uses for the source-language term
    #[serde(default = "default_source_key")]
    pub source_key: String,

    /// Header of the page column in exported files
    #[serde(default = "default_page_column")]
    pub page_column: String,

    /// Lowercase markers of title pages, dedications and printing notes
    #[serde(default = "default_front_matter_markers")]
    pub front_matter_markers: Vec<String>,

    /// Lowercase words of running headers and footers
    #[serde(default = "default_boilerplate_words")]
    pub boilerplate_words: Vec<String>,

    /// Pages with fewer trimmed characters are never entry pages
    #[serde(default = "default_min_page_chars")]
    pub min_page_chars: usize,

    /// A page needs more "term. gloss" lines than this to be an entry page
    #[serde(default = "default_entry_line_threshold")]
    pub entry_line_threshold: usize,

    /// Worked examples shown to the model
    #[serde(default = "default_prompt_examples")]
    pub examples: Vec<PromptExample>,
}

/// A scanned line and the entry the model should read from it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PromptExample {
    /// Line as it comes out of OCR
    pub scanned: String,
    /// Corrected output-language term
    pub output_term: String,
    /// Source-language term, verbatim
    pub source_term: String,
}

impl Default for DictionaryProfile {
    fn default() -> Self {
        Self {
            title: default_title(),
            author: default_author(),
            year: default_year(),
            source_language: default_source_language(),
            output_language: default_output_language(),
            output_key: default_output_key(),
            source_key: default_source_key(),
            page_column: default_page_column(),
            front_matter_markers: default_front_matter_markers(),
            boilerplate_words: default_boilerplate_words(),
            min_page_chars: default_min_page_chars(),
            entry_line_threshold: default_entry_line_threshold(),
            examples: default_prompt_examples(),
        }
    }
}

/// Language model provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    // @provider: Google Gemini
    #[default]
    Gemini,
    // @provider: Ollama
    Ollama,
    // @provider: Anthropic
    Anthropic,
}

impl ModelProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }

    /// Whether the provider refuses requests without an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for ModelProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: ModelProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(&provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(&provider_type),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Extraction service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: ModelProvider,

    /// Available providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Settings shared by all providers
    #[serde(default)]
    pub common: ExtractionCommonConfig,
}

/// Common generation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionCommonConfig {
    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens per page
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Transport-level retries for transient HTTP failures.
    /// Zero keeps the one-call-per-page behavior.
    #[serde(default)]
    pub retry_count: u32,

    /// Base backoff for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ExtractionCommonConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            retry_count: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Page loop settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProcessingConfig {
    /// First page to process (1-based, inclusive)
    #[serde(default = "default_start_page")]
    pub start_page: u32,

    /// Last page to process (1-based, inclusive); `None` means the last page
    #[serde(default)]
    pub end_page: Option<u32>,

    /// Pause after every model call, in milliseconds
    #[serde(default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,

    /// Rewrite the raw export and checkpoint every N processed pages (0 disables)
    #[serde(default = "default_flush_every_pages")]
    pub flush_every_pages: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            start_page: default_start_page(),
            end_page: default_end_page(),
            pacing_delay_ms: default_pacing_delay_ms(),
            flush_every_pages: default_flush_every_pages(),
        }
    }
}

/// Output file settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    /// Directory receiving every output file
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// File stem shared by the CSV, XLSX and checkpoint files
    #[serde(default = "default_basename")]
    pub basename: String,

    /// Also write the deduplicated, sorted and filtered export
    #[serde(default = "default_true")]
    pub write_refined: bool,

    /// Entries shown in the end-of-run sample
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            basename: default_basename(),
            write_refined: true,
            sample_size: default_sample_size(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_title() -> String {
    "Vocabulario de la lengua aymara".to_string()
}

fn default_author() -> String {
    "Ludovico Bertonio".to_string()
}

fn default_year() -> u16 {
    1612
}

fn default_source_language() -> String {
    "ay".to_string()
}

fn default_output_language() -> String {
    "es".to_string()
}

fn default_output_key() -> String {
    "espanol".to_string()
}

fn default_source_key() -> String {
    "aymara".to_string()
}

fn default_page_column() -> String {
    "pagina".to_string()
}

fn default_front_matter_markers() -> Vec<String> {
    [
        "vocabvlario", "dedicado", "compuesto", "impreso",
        "por francisco", "chucuito", "1612", "provinvia",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_boilerplate_words() -> Vec<String> {
    ["vocabvlario", "bertonio", "página"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_min_page_chars() -> usize {
    50
}

fn default_entry_line_threshold() -> usize {
    3
}

fn default_prompt_examples() -> Vec<PromptExample> {
    vec![
        PromptExample {
            scanned: "Agaulas en la garganta. Cchaña haque, añanque".to_string(),
            output_term: "Agallas en la garganta".to_string(),
            source_term: "Cchaña haque, añanque".to_string(),
        },
        PromptExample {
            scanned: "Agarrar hazrendo preja. Cchumi chapicha".to_string(),
            output_term: "Agarrar haciendo presa".to_string(),
            source_term: "Cchumi chapicha".to_string(),
        },
    ]
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_start_page() -> u32 {
    40 // the first pages are front matter
}

fn default_end_page() -> Option<u32> {
    Some(60)
}

fn default_pacing_delay_ms() -> u64 {
    1000
}

fn default_flush_every_pages() -> usize {
    10
}

fn default_output_directory() -> String {
    ".".to_string()
}

fn default_basename() -> String {
    "diccionario_aymara_espanol_bertonio".to_string()
}

fn default_sample_size() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_model(provider: &ModelProvider) -> String {
    match provider {
        ModelProvider::Gemini => "gemini-1.5-flash".to_string(),
        ModelProvider::Ollama => "llama3.2:3b".to_string(),
        ModelProvider::Anthropic => "claude-3-5-haiku-latest".to_string(),
    }
}

fn default_endpoint(provider: &ModelProvider) -> String {
    match provider {
        ModelProvider::Gemini => "https://generativelanguage.googleapis.com".to_string(),
        ModelProvider::Ollama => "http://localhost:11434".to_string(),
        ModelProvider::Anthropic => "https://api.anthropic.com".to_string(),
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let profile = &self.dictionary;
        let _source_name = crate::language_utils::get_language_name(&profile.source_language)?;
        let _output_name = crate::language_utils::get_language_name(&profile.output_language)?;
        if crate::language_utils::language_codes_match(&profile.source_language, &profile.output_language) {
            return Err(anyhow!("Source and output language are both '{}'", profile.source_language));
        }

        if profile.output_key.trim().is_empty() || profile.source_key.trim().is_empty() {
            return Err(anyhow!("Dictionary JSON keys must not be empty"));
        }
        if profile.output_key == profile.source_key {
            return Err(anyhow!("Dictionary JSON keys must differ, both are '{}'", profile.output_key));
        }

        let processing = &self.processing;
        if processing.start_page == 0 {
            return Err(anyhow!("start_page is 1-based and must be at least 1"));
        }
        if let Some(end_page) = processing.end_page {
            if end_page < processing.start_page {
                return Err(anyhow!(
                    "end_page ({}) must not be before start_page ({})",
                    end_page, processing.start_page
                ));
            }
        }

        if self.output.basename.trim().is_empty() {
            return Err(anyhow!("Output basename must not be empty"));
        }

        let provider = &self.extraction.provider;
        if provider.requires_api_key() && self.extraction.get_api_key().is_empty() {
            return Err(anyhow!("API key is required for {} provider", provider.display_name()));
        }

        Ok(())
    }

    /// Human-readable name of the language of the verbatim glosses
    pub fn source_language_name(&self) -> String {
        crate::language_utils::get_language_name(&self.dictionary.source_language)
            .unwrap_or_else(|_| self.dictionary.source_language.clone())
    }

    /// Human-readable name of the language of the corrected headwords
    pub fn output_language_name(&self) -> String {
        crate::language_utils::get_language_name(&self.dictionary.output_language)
            .unwrap_or_else(|_| self.dictionary.output_language.clone())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            dictionary: DictionaryProfile::default(),
            extraction: ExtractionConfig::default(),
            processing: ProcessingConfig::default(),
            output: OutputConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl ExtractionConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &ModelProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, created on demand
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let index = match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider.clone()));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.model.is_empty() => provider_config.model.clone(),
            _ => default_model(&self.provider),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.endpoint.is_empty() => provider_config.endpoint.clone(),
            _ => default_endpoint(&self.provider),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.timeout_secs > 0 => provider_config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            available_providers: vec![
                ProviderConfig::new(ModelProvider::Gemini),
                ProviderConfig::new(ModelProvider::Ollama),
                ProviderConfig::new(ModelProvider::Anthropic),
            ],
            common: ExtractionCommonConfig::default(),
        }
    }
}
