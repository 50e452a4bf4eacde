/*!
 * Tests for deduplication, sorting and noise filtering
 */

use lexiscribe::{Entry, ResultStore};

fn entry(source: &str, translated: &str, page: u32) -> Entry {
    Entry::new(source, translated, page).unwrap()
}

/// Repeated pairs keep the page of their first occurrence
#[test]
fn test_deduplicated_withRepeatedPair_shouldKeepFirstPage() {
    let store = ResultStore::new(vec![entry("A", "B", 1), entry("A", "B", 5), entry("C", "D", 2)]);
    assert_eq!(store.deduplicated(), vec![entry("A", "B", 1), entry("C", "D", 2)]);
}

/// Same headword with a different gloss is a different entry
#[test]
fn test_deduplicated_withDifferentGloss_shouldKeepBoth() {
    let store = ResultStore::new(vec![entry("Abeja", "Vmaña", 1), entry("Abeja", "Huayrunco", 1)]);
    assert_eq!(store.deduplicated().len(), 2);
}

/// Three and two characters are dropped; four and three are kept
#[test]
fn test_refined_atLengthBoundaries_shouldFilterShortTerms() {
    let store = ResultStore::new(vec![
        entry("Sol", "Inti", 1),
        entry("Agua", "Vm", 1),
        entry("Agua", "Vma", 1),
    ]);
    assert_eq!(store.refined(), vec![entry("Agua", "Vma", 1)]);
}

/// Sorting by headword is stable for equal headwords
#[test]
fn test_refined_withEqualHeadwords_shouldKeepExtractionOrder() {
    let store = ResultStore::new(vec![
        entry("Cielo", "Alakpacha", 3),
        entry("Abeja", "Vmaña", 2),
        entry("Abeja", "Huayrunco", 1),
    ]);
    let glosses: Vec<String> = store.refined().into_iter().map(|e| e.translated_term).collect();
    assert_eq!(glosses, vec!["Vmaña", "Huayrunco", "Alakpacha"]);
}

/// Refining leaves the stored entries untouched
#[test]
fn test_refined_shouldNotMutateStore() {
    let entries = vec![entry("Sol", "Inti", 1), entry("Abeja", "Vmaña", 2), entry("Abeja", "Vmaña", 3)];
    let store = ResultStore::new(entries.clone());
    let _ = store.refined();
    assert_eq!(store.entries(), entries.as_slice());
}

/// Statistics count distinct pages, not entries
#[test]
fn test_statistics_shouldReportPagesAndAverage() {
    let store = ResultStore::new(vec![entry("Abeja", "Vmaña", 41), entry("Abaxo", "Mancca", 41), entry("Cielo", "Alakpacha", 43), entry("Agua", "Vma", 43)]);
    let stats = store.statistics();
    assert_eq!(stats.distinct_pages, 2);
    assert_eq!(stats.average_per_page, 2.0);
    assert_eq!(stats.to_string(), "4 entries from 2 pages (2.0 per page)");
}
