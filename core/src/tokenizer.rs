use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

use crate::entities::{extract_entities, normalize, synonym_groups};

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"[a-z0-9]+").expect("valid regex");
}

/// NFKC normalization plus lowercasing, applied before any token scan.
fn fold(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

pub(crate) fn alnum_tokens(lower: &str) -> impl Iterator<Item = &str> + '_ {
    TOKEN_RE.find_iter(lower).map(|m| m.as_str())
}

/// Tokenize a query: plain alphanumeric tokens unioned with the canonical
/// terms produced by synonym normalization. Produces a set, so every present
/// token counts once.
pub fn tokenize_query(text: &str) -> HashSet<String> {
    let folded = fold(text);
    if folded.is_empty() {
        return HashSet::new();
    }
    let mut tokens: HashSet<String> = alnum_tokens(&folded).map(|t| t.to_string()).collect();
    let (_, terms) = normalize(&folded);
    tokens.extend(terms);
    tokens
}

/// Tokenize a document for indexing: plain alphanumeric tokens, every matched
/// entity value, and, for each synonym group whose canonical form or any
/// variant occurs as a substring of the text, the canonical form plus every
/// variant with internal spaces removed. Substring matching is intentional:
/// compound phrases like "zip code" must index under "zipcode" even inside
/// longer runs of text.
pub fn tokenize_document(text: &str) -> HashSet<String> {
    let folded = fold(text);
    if folded.is_empty() {
        return HashSet::new();
    }
    let mut tokens: HashSet<String> = alnum_tokens(&folded).map(|t| t.to_string()).collect();

    for (_category, values) in extract_entities(&folded) {
        tokens.extend(values);
    }

    for (canonical, variants) in synonym_groups() {
        let mentioned =
            folded.contains(canonical) || variants.iter().any(|v| folded.contains(v));
        if mentioned {
            tokens.insert((*canonical).to_string());
            tokens.extend(variants.iter().map(|v| v.replace(' ', "")));
        }
    }
    tokens
}
