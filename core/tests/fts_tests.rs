use formally_core::corpus::QuestionRecord;
use formally_core::fts::{FtsBackend, FtsRow, FtsSearch};
use formally_core::strategy::{SearchError, SearchStrategy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
struct MockBackend {
    rows: Vec<FtsRow>,
    queries: Arc<AtomicUsize>,
    inits: Arc<AtomicUsize>,
}

impl MockBackend {
    fn with_rows(rows: Vec<FtsRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }
}

impl FtsBackend for MockBackend {
    fn initialize(&self, _corpus: &[QuestionRecord]) -> Result<(), SearchError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn query(&self, _query: &str, limit: usize) -> Result<Vec<FtsRow>, SearchError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.iter().take(limit).cloned().collect())
    }
}

fn row(key: &str, question: &str, rank: f32) -> FtsRow {
    FtsRow {
        export_name: format!("{key}_export"),
        key: key.to_string(),
        question: question.to_string(),
        context: String::new(),
        field_title: String::new(),
        rank,
    }
}

#[test]
fn short_queries_never_reach_the_backend() {
    let backend = MockBackend::default();
    let fts = FtsSearch::new(backend.clone());
    fts.initialize(&[]).unwrap();

    assert!(fts.search("ab", 5, false).unwrap().is_empty());
    assert!(fts.search("  a ", 5, false).unwrap().is_empty());
    assert!(fts.search("", 5, false).unwrap().is_empty());
    assert_eq!(backend.queries.load(Ordering::SeqCst), 0);
}

#[test]
fn queries_are_gated_until_initialization_completes() {
    let backend = MockBackend::with_rows(vec![row("ADDR1", "Your address", 0.5)]);
    let fts = FtsSearch::new(backend.clone());

    match fts.search("address", 5, false) {
        Err(SearchError::NotReady) => {}
        other => panic!("expected NotReady, got {other:?}"),
    }
    assert_eq!(backend.queries.load(Ordering::SeqCst), 0);

    fts.initialize(&[]).unwrap();
    assert_eq!(backend.inits.load(Ordering::SeqCst), 1);
    let results = fts.search("address", 5, false).unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn prefix_boost_reorders_and_keys_deduplicate() {
    let backend = MockBackend::with_rows(vec![
        row("ADDR_LINE", "Your addr goes here", 0.3),
        row("OTHER", "Unrelated question", 0.4),
        row("OTHER", "Unrelated duplicate", 0.2),
    ]);
    let fts = FtsSearch::new(backend.clone());
    fts.initialize(&[]).unwrap();

    let results = fts.search("addr", 5, false).unwrap();
    assert_eq!(results.len(), 2);
    // 0.3 doubles past 0.4 thanks to the ADDR key prefix.
    assert_eq!(results[0].key, "ADDR_LINE");
    assert!((results[0].score - 0.6).abs() < 1e-6);
    assert_eq!(results[0].rank, 1);
    assert_eq!(results[1].key, "OTHER");
    assert_eq!(results[1].rank, 2);
}

#[test]
fn confidence_applies_substring_boost_and_caps() {
    let backend = MockBackend::with_rows(vec![row("ADDR_LINE", "Your addr goes here", 0.3)]);
    let fts = FtsSearch::new(backend.clone());
    fts.initialize(&[]).unwrap();

    let results = fts.search("addr", 5, false).unwrap();
    // Boosted score 0.6 -> 60%, then x1.5 for the literal substring match.
    assert!((results[0].confidence_percent - 90.0).abs() < 1e-3);
    assert!(results[0]
        .highlighted_question
        .contains("<mark>addr</mark>"));

    let backend = MockBackend::with_rows(vec![row("ADDR_LINE", "Your addr goes here", 0.9)]);
    let fts = FtsSearch::new(backend);
    fts.initialize(&[]).unwrap();
    let results = fts.search("addr", 5, false).unwrap();
    // 1.8 -> capped at 100, x1.5 -> capped again.
    assert!((results[0].confidence_percent - 100.0).abs() < 1e-3);
}
