use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::entities::expand_synonyms;
use crate::highlight::highlight;
use crate::index::{DocId, IndexSnapshot};
use crate::tokenizer::tokenize_query;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub export_name: String,
    pub key: String,
    pub question: String,
    pub context: String,
    pub field_title: String,
    pub score: f32,
    pub rank: usize,
    pub confidence_percent: f32,
    pub highlighted_question: String,
}

/// Rank documents in the snapshot against a free-text query.
///
/// `questions_only` is accepted for contract compatibility and currently does
/// not alter scoring.
pub fn search(
    snapshot: &IndexSnapshot,
    query: &str,
    top_n: usize,
    _questions_only: bool,
) -> Vec<SearchResult> {
    let query_tokens = tokenize_query(query);
    if query_tokens.is_empty() {
        return Vec::new();
    }
    let top_n = top_n.max(1);

    let mut scores: HashMap<DocId, f32> = HashMap::new();
    let mut query_norm = 0.0f32;

    // Query tokens come out of a set, so the query tf is 1 and the per-token
    // weight reduces to the idf.
    for token in &query_tokens {
        let Some(postings) = snapshot.inverted.get(token) else {
            continue;
        };
        let idf = snapshot.idf.get(token).copied().unwrap_or(0.0);
        let query_weight = idf;
        query_norm += query_weight * query_weight;

        for &doc_id in postings {
            let doc = &snapshot.documents[doc_id];
            let tf = doc
                .token_freq
                .get(token)
                .map(|&f| 1.0 + (f as f32).ln())
                .unwrap_or(0.0);
            let doc_weight = tf * idf;
            *scores.entry(doc_id).or_insert(0.0) += query_weight * doc_weight;
        }
    }

    let query_norm = if query_norm > 0.0 { query_norm.sqrt() } else { 1.0 };
    for (doc_id, score) in scores.iter_mut() {
        *score /= query_norm * snapshot.doc_norms[*doc_id];
    }

    // Key-prefix boost. Documents that never matched a token stay out of the
    // scored set: a doubled zero must not surface them.
    let query_upper = query.to_uppercase();
    for (doc_id, score) in scores.iter_mut() {
        if snapshot.documents[*doc_id].key.starts_with(&query_upper) {
            *score *= 2.0;
        }
    }

    let mut scored: Vec<(DocId, f32)> = scores.into_iter().filter(|(_, s)| *s > 0.0).collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    // Keep the best-scoring document per key, stop at top_n unique keys.
    let mut seen_keys: HashSet<&str> = HashSet::new();
    let mut unique: Vec<(DocId, f32)> = Vec::new();
    for (doc_id, score) in scored {
        if seen_keys.insert(snapshot.documents[doc_id].key.as_str()) {
            unique.push((doc_id, score));
            if unique.len() >= top_n {
                break;
            }
        }
    }

    let highlight_tokens = expand_synonyms(&query_tokens);
    let query_lower = query.to_lowercase();
    let mut results = Vec::with_capacity(unique.len());
    for (rank, (doc_id, score)) in unique.into_iter().enumerate() {
        let doc = &snapshot.documents[doc_id];
        let mut confidence = (score * 100.0).min(100.0);
        if doc.question.to_lowercase().contains(&query_lower) {
            confidence = (confidence * 1.5).min(100.0);
        }
        results.push(SearchResult {
            export_name: doc.export_name.clone(),
            key: doc.key.clone(),
            question: doc.question.clone(),
            context: doc.context.clone(),
            field_title: doc.field_title.clone(),
            score,
            rank: rank + 1,
            confidence_percent: confidence,
            highlighted_question: highlight(&doc.question, &highlight_tokens),
        });
    }
    results
}
