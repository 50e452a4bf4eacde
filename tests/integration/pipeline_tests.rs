/*!
 * Page loop tests over whole in-memory documents
 */

use std::time::Duration;

use lexiscribe::app_config::Config;
use lexiscribe::document::{Document, MemoryDocument};
use lexiscribe::extraction::{
    EntryExtractor, PageFailureKind, PageFilter, PageOutcome, PageProcessor, PageRange, SkipReason, TextCleaner,
};
use lexiscribe::providers::mock::{MockModel, MockStep};

use crate::common::{self, answer, ENTRY_PAGE, FRONT_MATTER_PAGE, SECOND_ENTRY_PAGE};

fn processor(model: MockModel) -> PageProcessor<EntryExtractor<MockModel>> {
    PageProcessor::new(
        PageFilter::default(),
        TextCleaner::default(),
        EntryExtractor::from_config(model, &Config::default()),
        Duration::ZERO,
    )
}

#[tokio::test]
async fn test_run_withFrontMatterEntriesAndFailure_shouldReportEachPage() {
    common::init_logging();
    let document = MemoryDocument::new(vec![FRONT_MATTER_PAGE, ENTRY_PAGE, SECOND_ENTRY_PAGE]);
    let model = MockModel::scripted(vec![
        MockStep::Reply(answer(&[("Abeja de miel", "Vmaña"), ("Abejon que zumba", "Ccumurumu")])),
        MockStep::Fail("model overloaded".to_string()),
    ]);
    let processor = processor(model.clone());

    let result = processor.run(&document, PageRange::resolve(1, None, document.page_count())).await;

    // the title page never reaches the model
    assert_eq!(model.request_count(), 2);
    assert_eq!(result.pages_processed, 1);
    assert_eq!(result.pages_skipped, 1);
    assert_eq!(result.entries.len(), 2);
    assert!(result.entries.iter().all(|e| e.page_number == 2));
    assert_eq!(result.errored_pages.iter().copied().collect::<Vec<_>>(), vec![3]);
    assert!(!result.errored_pages.contains(&1));
    assert_eq!(result.failures[0].kind, PageFailureKind::Model);
    assert_eq!(result.last_page_visited, Some(3));
    assert!(result.summary().ends_with("errored pages: 3"));
}

#[tokio::test]
async fn test_run_withInvalidJson_shouldContinueWithNextPage() {
    let document = MemoryDocument::new(vec![ENTRY_PAGE, SECOND_ENTRY_PAGE]);
    let model = MockModel::scripted(vec![
        MockStep::Reply("Sorry, I could not read this page.".to_string()),
        MockStep::Reply(MockModel::fenced(&answer(&[("Agua que corre", "Vma sarasiri")]))),
    ]);

    let result = processor(model).run(&document, PageRange::resolve(1, None, 2)).await;

    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].page_number, 2);
    assert_eq!(result.entries[0].source_term, "Agua que corre");
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].page_number, 1);
    assert_eq!(result.failures[0].kind, PageFailureKind::Parse);
    assert_eq!(
        result.failures[0].raw_response.as_deref(),
        Some("Sorry, I could not read this page.")
    );
}

#[tokio::test]
async fn test_run_withUnreadablePage_shouldRecordLoadFailure() {
    let document = MemoryDocument::with_pages(vec![
        None,
        Some(SECOND_ENTRY_PAGE.to_string()),
    ]);
    let model = MockModel::fixed(answer(&[("Aguja para coser", "Ccauchi")]));

    let result = processor(model.clone()).run(&document, PageRange::resolve(1, None, 2)).await;

    assert_eq!(model.request_count(), 1);
    assert_eq!(result.errored_pages.iter().copied().collect::<Vec<_>>(), vec![1]);
    assert_eq!(result.failures[0].kind, PageFailureKind::Load);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.pages_processed, 1);
}

#[tokio::test]
async fn test_run_withSubRange_shouldOnlyVisitThosePages() {
    let document = MemoryDocument::new(vec![ENTRY_PAGE; 6]);
    let model = MockModel::fixed(answer(&[("Abeja de miel", "Vmaña")]));

    let result = processor(model.clone()).run(&document, PageRange::resolve(3, Some(4), 6)).await;

    assert_eq!(model.request_count(), 2);
    let pages: Vec<u32> = result.entries.iter().map(|e| e.page_number).collect();
    assert_eq!(pages, vec![3, 4]);
    assert_eq!(result.last_page_visited, Some(4));
}

#[tokio::test]
async fn test_run_withEndBeyondDocument_shouldClampToLastPage() {
    let document = MemoryDocument::new(vec![ENTRY_PAGE, ENTRY_PAGE]);
    let range = PageRange::resolve(1, Some(50), document.page_count());

    let result = processor(MockModel::fixed("[]")).run(&document, range).await;

    assert_eq!(range.end, 2);
    assert_eq!(result.last_page_visited, Some(2));
    assert!(result.entries.is_empty());
    assert!(result.errored_pages.is_empty());
}

#[tokio::test]
async fn test_run_withStartBeyondDocument_shouldDoNothing() {
    let document = MemoryDocument::new(vec![ENTRY_PAGE]);
    let model = MockModel::fixed("[]");

    let result = processor(model.clone()).run(&document, PageRange::resolve(5, None, 1)).await;

    assert_eq!(model.request_count(), 0);
    assert_eq!(result.last_page_visited, None);
}

#[tokio::test]
async fn test_runWithObserver_shouldSeeEveryPageInOrder() {
    let document = MemoryDocument::new(vec![FRONT_MATTER_PAGE, ENTRY_PAGE, "   "]);
    let model = MockModel::fixed(answer(&[("Abeja de miel", "Vmaña")]));
    let mut seen = Vec::new();

    processor(model)
        .run_with_observer(
            &document,
            PageRange::resolve(1, None, 3),
            Default::default(),
            |page, outcome, _| seen.push((page, outcome.clone())),
        )
        .await;

    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], (1, PageOutcome::Skipped(SkipReason::NotEntryPage)));
    assert_eq!(seen[1], (2, PageOutcome::Extracted(1)));
    assert!(matches!(seen[2], (3, PageOutcome::Skipped(_))));
}

#[tokio::test]
async fn test_run_shouldSendCleanedTextInPrompt() {
    let document = MemoryDocument::new(vec![ENTRY_PAGE]);
    let processor = processor(MockModel::fixed("[]"));

    processor.run(&document, PageRange::resolve(1, None, 1)).await;

    let prompts = processor.extractor().model().prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Abeja de miel. Vmaña"));
    assert!(prompts[0].contains("page 1"));
}

#[tokio::test]
async fn test_run_withIntermittentModel_shouldErrorEveryOtherPageAndFinish() {
    let document = MemoryDocument::new(vec![ENTRY_PAGE, SECOND_ENTRY_PAGE, ENTRY_PAGE, SECOND_ENTRY_PAGE]);
    let model = MockModel::intermittent(2);

    let result = processor(model.clone()).run(&document, PageRange::resolve(1, None, 4)).await;

    assert_eq!(model.request_count(), 4);
    assert_eq!(result.errored_pages.iter().copied().collect::<Vec<_>>(), vec![2, 4]);
    assert!(result.failures.iter().all(|f| f.kind == PageFailureKind::Model));
    assert_eq!(result.last_page_visited, Some(4));
    assert_eq!(result.pages_processed, 0);
}

/// Answers only for the page that mentions running water
fn water_answer(prompt: &str) -> String {
    if prompt.contains("Agua que corre") {
        answer(&[("Agua que corre", "Vma sarasiri")])
    } else {
        "[]".to_string()
    }
}

#[tokio::test]
async fn test_run_withPromptDependentAnswers_shouldTagMatchingPage() {
    let document = MemoryDocument::new(vec![ENTRY_PAGE, SECOND_ENTRY_PAGE]);
    let model = MockModel::fixed("[]").with_custom_response(water_answer);

    let result = processor(model).run(&document, PageRange::resolve(1, None, 2)).await;

    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].page_number, 2);
    assert_eq!(result.entries[0].translated_term, "Vma sarasiri");
    assert_eq!(result.pages_processed, 1);
    assert!(result.errored_pages.is_empty());
}
