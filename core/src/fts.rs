//! Relational full-text-search strategy seam.
//!
//! The engine in this crate is the in-memory strategy; deployments can point
//! the same query contract at a persistent full-text index instead (e.g.
//! Postgres `tsvector`). The database client lives behind [`FtsBackend`];
//! everything that keeps the two strategies interchangeable — the minimum
//! query length, the key-prefix boost, key deduplication, the confidence
//! formula, highlighting — is applied here, so a backend only has to return
//! raw ranked rows.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::corpus::QuestionRecord;
use crate::highlight::highlight;
use crate::search::SearchResult;
use crate::strategy::{SearchError, SearchStrategy};

/// Minimum trimmed query length before the backend is consulted.
pub const MIN_QUERY_LEN: usize = 3;

/// A row returned by the backing full-text index: ranked, unboosted.
#[derive(Debug, Clone)]
pub struct FtsRow {
    pub export_name: String,
    pub key: String,
    pub question: String,
    pub context: String,
    pub field_title: String,
    pub rank: f32,
}

pub trait FtsBackend: Send + Sync {
    /// One-time schema creation, corpus load, and index creation. Must be
    /// idempotent; runs once before the strategy accepts queries.
    fn initialize(&self, corpus: &[QuestionRecord]) -> Result<(), SearchError>;

    /// Run the raw full-text query, returning up to `limit` ranked rows.
    fn query(&self, query: &str, limit: usize) -> Result<Vec<FtsRow>, SearchError>;
}

pub struct FtsSearch<B> {
    backend: B,
    ready: AtomicBool,
}

impl<B: FtsBackend> FtsSearch<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            ready: AtomicBool::new(false),
        }
    }

    /// Run the backend's one-time initialization and open the query gate.
    pub fn initialize(&self, corpus: &[QuestionRecord]) -> Result<(), SearchError> {
        self.backend.initialize(corpus)?;
        self.ready.store(true, Ordering::Release);
        Ok(())
    }
}

impl<B: FtsBackend> SearchStrategy for FtsSearch<B> {
    fn id(&self) -> &'static str {
        "postgres"
    }

    fn name(&self) -> &'static str {
        "PostgreSQL FTS"
    }

    fn describe(&self) -> &'static str {
        "Production-ready full-text search"
    }

    fn search(
        &self,
        query: &str,
        top_n: usize,
        _questions_only: bool,
    ) -> Result<Vec<SearchResult>, SearchError> {
        // Too-short queries are an input anomaly, not an error, and must not
        // touch the backend at all.
        if query.trim().chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }
        if !self.ready.load(Ordering::Acquire) {
            return Err(SearchError::NotReady);
        }
        let top_n = top_n.max(1);
        let rows = self.backend.query(query, top_n)?;

        let query_upper = query.to_uppercase();
        let mut scored: Vec<(FtsRow, f32)> = rows
            .into_iter()
            .map(|row| {
                let boosted = if row.key.starts_with(&query_upper) {
                    row.rank * 2.0
                } else {
                    row.rank
                };
                (row, boosted)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let query_terms: HashSet<String> =
            query.split_whitespace().map(|t| t.to_string()).collect();
        let query_lower = query.to_lowercase();
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut results: Vec<SearchResult> = Vec::new();
        for (row, score) in scored {
            if results.len() >= top_n {
                break;
            }
            if !seen_keys.insert(row.key.clone()) {
                continue;
            }
            let mut confidence = (score * 100.0).min(100.0);
            if row.question.to_lowercase().contains(&query_lower) {
                confidence = (confidence * 1.5).min(100.0);
            }
            let highlighted_question = highlight(&row.question, &query_terms);
            results.push(SearchResult {
                export_name: row.export_name,
                key: row.key,
                question: row.question,
                context: row.context,
                field_title: row.field_title,
                score,
                rank: results.len() + 1,
                confidence_percent: confidence,
                highlighted_question,
            });
        }
        Ok(results)
    }
}
