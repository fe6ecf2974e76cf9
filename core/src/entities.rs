use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::tokenizer::alnum_tokens;

/// Entity categories recognized in form-field text, each with an ordered list
/// of patterns applied against the lower-cased text.
static ENTITY_PATTERNS: &[(&str, &[&str])] = &[
    (
        "ADDRESS",
        &[
            r"\b(street|address|apt|apartment|suite|floor|unit|city|state|country|province)\b",
            r"\b(current|previous|foreign|mailing|home|work)\s+address\b",
        ],
    ),
    (
        "POSTAL",
        &[
            r"\b(zip\s*code?|postal\s*code?|zipcode|postalcode)\b",
            r"\b\d{5}(-\d{4})?\b",
        ],
    ),
    (
        "NAME",
        &[
            r"\b(first|last|middle|full|maiden|nick)\s*name\b",
            r"\b(name|surname|given\s*name)\b",
        ],
    ),
    (
        "DATE",
        &[
            r"\b(date|dob|birth\s*date|expiry|expire|start|end|from|to)\b",
            r"\b(month|year|day)\b",
        ],
    ),
    (
        "CONTACT",
        &[
            r"\b(email|e-mail|phone|mobile|cell|fax|telephone)\b",
            r"\b(contact|reach)\b",
        ],
    ),
    (
        "ID",
        &[
            r"\b(ssn|social\s*security|passport|license|visa|ein|tin)\b",
            r"\b(number|id|identifier)\b",
        ],
    ),
    (
        "IMMIGRATION",
        &[
            r"\b(h1b|o1a|o1b|eb1|eb2|i-94|i-20|ds-2019)\b",
            r"\b(visa|status|petition|immigration)\b",
        ],
    ),
];

/// Canonical field names and the phrase variants that collapse onto them.
static FIELD_SYNONYMS: &[(&str, &[&str])] = &[
    ("zipcode", &["zip code", "zip-code", "postal code", "postcode", "zip"]),
    ("email", &["e-mail", "email address", "electronic mail"]),
    ("phone", &["telephone", "phone number", "tel", "mobile", "cell"]),
    ("address", &["addr", "location", "residence"]),
    ("apartment", &["apt", "unit", "suite", "flat"]),
    ("firstname", &["first name", "given name", "forename"]),
    ("lastname", &["last name", "surname", "family name"]),
    ("dob", &["date of birth", "birth date", "birthday"]),
    ("ssn", &["social security number", "social security", "ss#"]),
];

lazy_static! {
    static ref COMPILED_PATTERNS: Vec<(&'static str, Vec<Regex>)> = ENTITY_PATTERNS
        .iter()
        .map(|(category, patterns)| {
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(p).expect("valid entity pattern"))
                .collect();
            (*category, compiled)
        })
        .collect();

    /// Any variant or canonical form (lower-cased) -> canonical form.
    static ref SYNONYM_LOOKUP: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        for (canonical, variants) in FIELD_SYNONYMS {
            for variant in *variants {
                map.insert(*variant, *canonical);
            }
            map.insert(*canonical, *canonical);
        }
        map
    };

    /// (phrase, canonical) pairs, longest phrase first so "zip" cannot
    /// pre-empt "zip code" during the normalize scan.
    static ref PHRASES_LONGEST_FIRST: Vec<(&'static str, &'static str)> = {
        let mut phrases: Vec<_> = SYNONYM_LOOKUP.iter().map(|(p, c)| (*p, *c)).collect();
        phrases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        phrases
    };
}

pub fn synonym_groups() -> &'static [(&'static str, &'static [&'static str])] {
    FIELD_SYNONYMS
}

/// Extract form-field entities from text. A category is present in the result
/// only when at least one of its patterns matched; matched substrings are
/// deduplicated per category.
pub fn extract_entities(text: &str) -> HashMap<&'static str, HashSet<String>> {
    let lower = text.to_lowercase();
    let mut entities: HashMap<&'static str, HashSet<String>> = HashMap::new();
    for (category, patterns) in COMPILED_PATTERNS.iter() {
        let mut matches: HashSet<String> = HashSet::new();
        for pattern in patterns {
            for m in pattern.find_iter(&lower) {
                matches.insert(m.as_str().to_string());
            }
        }
        if !matches.is_empty() {
            entities.insert(*category, matches);
        }
    }
    entities
}

/// Collapse known phrase variants to their canonical forms.
///
/// Returns the canonicalized text and the term set: every canonical form
/// touched by the scan, unioned with the plain alphanumeric tokens of the
/// original text. Canonicalization adds to the raw token stream, it never
/// replaces it.
pub fn normalize(text: &str) -> (String, HashSet<String>) {
    let lower = text.to_lowercase();
    let mut canonicalized = lower.clone();
    let mut terms: HashSet<String> = HashSet::new();

    for (phrase, canonical) in PHRASES_LONGEST_FIRST.iter() {
        if canonicalized.contains(phrase) {
            terms.insert((*canonical).to_string());
            canonicalized = canonicalized.replace(phrase, canonical);
        }
    }
    for token in alnum_tokens(&lower) {
        terms.insert(token.to_string());
    }
    (canonicalized, terms)
}

/// Expand tokens with the full phrase set of any synonym group they belong
/// to, so a canonicalized query term can still be marked in text that spells
/// a different variant of the same field.
pub fn expand_synonyms(tokens: &HashSet<String>) -> HashSet<String> {
    let mut expanded = tokens.clone();
    for token in tokens {
        if let Some(canonical) = SYNONYM_LOOKUP.get(token.as_str()) {
            expanded.insert((*canonical).to_string());
            for (group, variants) in FIELD_SYNONYMS {
                if group == canonical {
                    expanded.extend(variants.iter().map(|v| (*v).to_string()));
                }
            }
        }
    }
    expanded
}
