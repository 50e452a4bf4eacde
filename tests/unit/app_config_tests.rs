/*!
 * Tests for configuration loading and validation
 */

use std::str::FromStr;

use lexiscribe::app_config::{Config, LogLevel, ModelProvider};

/// A partial config file falls back to defaults for everything it omits
#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() {
    let json = r#"{
        "processing": { "start_page": 5, "end_page": null },
        "extraction": { "provider": "ollama" }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.processing.start_page, 5);
    assert_eq!(config.processing.end_page, None);
    assert_eq!(config.processing.pacing_delay_ms, 1000);
    assert_eq!(config.extraction.provider, ModelProvider::Ollama);
    assert_eq!(config.dictionary.output_key, "espanol");
    assert_eq!(config.dictionary.source_key, "aymara");
    assert_eq!(config.dictionary.page_column, "pagina");
    assert_eq!(config.output.sample_size, 5);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// The default config survives a round trip through its own JSON
#[test]
fn test_serialize_withDefaultConfig_shouldReloadEqualValues() {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let reloaded: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(reloaded.dictionary.front_matter_markers, config.dictionary.front_matter_markers);
    assert_eq!(reloaded.dictionary.examples, config.dictionary.examples);
    assert_eq!(reloaded.extraction.get_model(), "gemini-1.5-flash");
    assert_eq!(reloaded.processing.end_page, Some(60));
    assert!(json.contains("\"type\": \"gemini\""));
}

/// Provider names parse case-insensitively
#[test]
fn test_modelProvider_fromStr_shouldParseKnownNames() {
    assert_eq!(ModelProvider::from_str("Gemini").unwrap(), ModelProvider::Gemini);
    assert_eq!(ModelProvider::from_str("ollama").unwrap(), ModelProvider::Ollama);
    assert_eq!(ModelProvider::from_str("ANTHROPIC").unwrap(), ModelProvider::Anthropic);
    assert!(ModelProvider::from_str("openai").is_err());
}

/// Unknown or identical language codes are rejected
#[test]
fn test_validate_withBadLanguages_shouldFail() {
    let mut config = Config::default();
    config.extraction.provider = ModelProvider::Ollama;

    config.dictionary.source_language = "zz".to_string();
    assert!(config.validate().is_err());

    config.dictionary.source_language = "spa".to_string();
    config.dictionary.output_language = "es".to_string();
    assert!(config.validate().is_err());

    config.dictionary.source_language = "qu".to_string();
    assert!(config.validate().is_ok());
}

/// An empty basename would write hidden files like ".csv"
#[test]
fn test_validate_withEmptyBasename_shouldFail() {
    let mut config = Config::default();
    config.extraction.provider = ModelProvider::Ollama;
    config.output.basename = "  ".to_string();
    assert!(config.validate().is_err());
}
