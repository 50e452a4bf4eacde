/*!
 * Tests for model answer parsing and the entry extractor
 */

use lexiscribe::app_config::Config;
use lexiscribe::errors::ExtractionError;
use lexiscribe::extraction::{parse_entries, strip_code_fences, EntryExtractor, ExtractionPrompt, TextToEntries};
use lexiscribe::providers::mock::MockModel;
use crate::common;

/// Fenced answers are parsed like bare ones
#[test]
fn test_parseEntries_withFencedAndBareAnswers_shouldAgree() {
    let json = common::answer(&[("Abeja de miel", "Vmaña"), ("Abaxo", "Mancca")]);
    let fenced = MockModel::fenced(&json);

    let bare_entries = parse_entries(&json, 41, "espanol", "aymara").unwrap();
    let fenced_entries = parse_entries(&fenced, 41, "espanol", "aymara").unwrap();

    assert_eq!(bare_entries, fenced_entries);
    assert_eq!(bare_entries.len(), 2);
    assert!(bare_entries.iter().all(|e| e.page_number == 41));
}

/// A fence without a language tag is stripped too
#[test]
fn test_stripCodeFences_withPlainFence_shouldReturnJson() {
    assert_eq!(strip_code_fences("```\n[{\"a\": 1}]\n```\n"), "[{\"a\": 1}]");
}

/// Whitespace-only terms count as missing
#[test]
fn test_parseEntries_withBlankTerms_shouldDropEntry() {
    let json = common::answer(&[("   ", "Vmaña"), ("Abeja", "\t"), ("Abaxo", "Mancca")]);
    let entries = parse_entries(&json, 2, "espanol", "aymara").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].source_term, "Abaxo");
}

/// Answers in other keys yield no entries, not an error
#[test]
fn test_parseEntries_withOtherKeys_shouldReturnEmpty() {
    let json = MockModel::entries_json("spanish", "aymara", &[("Abeja", "Vmaña")]);
    assert!(parse_entries(&json, 2, "espanol", "aymara").unwrap().is_empty());
}

/// Truncated JSON is a parse failure that keeps the raw answer
#[test]
fn test_parseEntries_withTruncatedJson_shouldKeepRawResponse() {
    let raw = "```json\n[{\"espanol\": \"Abeja\", \"aym";
    match parse_entries(raw, 9, "espanol", "aymara") {
        Err(ExtractionError::InvalidJson { page_number, raw_response, .. }) => {
            assert_eq!(page_number, 9);
            assert_eq!(raw_response, raw);
        }
        other => panic!("expected InvalidJson, got {:?}", other),
    }
}

/// The extractor honors the profile's JSON keys end to end
#[tokio::test]
async fn test_extract_withCustomKeys_shouldReadThoseKeys() {
    common::init_logging();
    let mut config = Config::default();
    config.dictionary.output_key = "es".to_string();
    config.dictionary.source_key = "qu".to_string();
    config.dictionary.source_language = "qu".to_string();

    let model = MockModel::fixed(MockModel::entries_json("es", "qu", &[("Perro", "Allqu")]));
    let extractor = EntryExtractor::from_config(model.clone(), &config);

    let entries = extractor.extract("Perro. Allqu", 3).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].translated_term, "Allqu");
    let prompt = &model.prompts()[0];
    assert!(prompt.contains("Quechua"));
    assert!(prompt.contains("\"es\": \"corrected term\""));
}

/// Prose answers surface as parse failures for the page
#[tokio::test]
async fn test_extract_withMalformedModel_shouldReturnInvalidJson() {
    let extractor = EntryExtractor::new(MockModel::malformed(), ExtractionPrompt::default());
    let result = extractor.extract("Abeja de miel. Vmaña", 12).await;
    assert!(matches!(result, Err(ExtractionError::InvalidJson { page_number: 12, .. })));
}

/// An empty answer is not valid JSON
#[tokio::test]
async fn test_extract_withEmptyAnswer_shouldReturnInvalidJson() {
    let extractor = EntryExtractor::new(MockModel::empty(), ExtractionPrompt::default());
    assert!(extractor.extract("Abeja de miel. Vmaña", 1).await.is_err());
}
