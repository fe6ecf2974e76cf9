use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::corpus::QuestionRecord;
use crate::tokenizer::tokenize_document;

pub type DocId = usize;

#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub export_name: String,
    pub key: String,
    pub question: String,
    pub context: String,
    pub field_title: String,
    pub tokens: HashSet<String>,
    /// Ordered so norm accumulation is deterministic across rebuilds.
    pub token_freq: BTreeMap<String, u32>,
}

/// The immutable bundle produced by one build pass: documents, inverted
/// index, idf table, and per-document norms. Queries never mutate it; a
/// rebuild produces a whole new snapshot.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    pub documents: Vec<Document>,
    pub inverted: HashMap<String, HashSet<DocId>>,
    pub idf: HashMap<String, f32>,
    pub doc_norms: Vec<f32>,
}

impl IndexSnapshot {
    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }
}

/// Build an index snapshot from corpus records.
///
/// Records missing a required field fail the build: refusing to start beats
/// serving a silently truncated library.
pub fn build(records: Vec<QuestionRecord>) -> Result<IndexSnapshot> {
    let mut documents = Vec::with_capacity(records.len());
    let mut inverted: HashMap<String, HashSet<DocId>> = HashMap::new();

    for (id, record) in records.into_iter().enumerate() {
        validate_record(id, &record)?;
        let searchable = format!(
            "{} {} {}",
            record.question, record.context, record.field_title
        );
        let tokens = tokenize_document(&searchable);

        // Token sets are deduplicated, so every per-document frequency is 1.
        let token_freq: BTreeMap<String, u32> = tokens.iter().map(|t| (t.clone(), 1)).collect();
        for token in &tokens {
            inverted.entry(token.clone()).or_default().insert(id);
        }

        documents.push(Document {
            id,
            export_name: record.export_name,
            key: record.key,
            question: record.question,
            context: record.context,
            field_title: record.field_title,
            tokens,
            token_freq,
        });
    }

    // idf needs the full document-frequency counts, hence the second pass.
    let num_docs = documents.len();
    let mut idf: HashMap<String, f32> = HashMap::with_capacity(inverted.len());
    for (token, postings) in &inverted {
        idf.insert(
            token.clone(),
            ((num_docs as f32) / (postings.len() as f32)).ln(),
        );
    }

    let mut doc_norms = Vec::with_capacity(num_docs);
    for doc in &documents {
        let mut norm = 0.0f32;
        for (token, &freq) in &doc.token_freq {
            let tf = 1.0 + (freq as f32).ln();
            let weight = tf * idf.get(token).copied().unwrap_or(0.0);
            norm += weight * weight;
        }
        let norm = norm.sqrt();
        doc_norms.push(if norm == 0.0 { 1.0 } else { norm });
    }

    tracing::debug!(num_docs, num_terms = inverted.len(), "index snapshot built");

    Ok(IndexSnapshot {
        documents,
        inverted,
        idf,
        doc_norms,
    })
}

fn validate_record(id: usize, record: &QuestionRecord) -> Result<()> {
    for (field, value) in [
        ("export_name", &record.export_name),
        ("key", &record.key),
        ("question", &record.question),
    ] {
        if value.trim().is_empty() {
            bail!(
                "corpus record {id} (key {:?}) is missing required field `{field}`",
                record.key
            );
        }
    }
    Ok(())
}
