use regex::RegexBuilder;
use std::collections::HashSet;

/// Wrap whole-word, case-insensitive occurrences of each token in
/// `<mark>..</mark>`, keeping the matched text's original casing. Tokens are
/// applied longest-first so the output does not depend on set iteration
/// order; later tokens operate on the progressively-marked string, with word
/// boundaries preventing re-wrapping inside earlier marks.
pub fn highlight(text: &str, tokens: &HashSet<String>) -> String {
    let mut ordered: Vec<&String> = tokens.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

    let mut marked = text.to_string();
    for token in ordered {
        if token.trim().is_empty() {
            continue;
        }
        let pattern = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(token)))
            .case_insensitive(true)
            .build()
            .expect("escaped token is a valid pattern");
        marked = pattern.replace_all(&marked, "<mark>${0}</mark>").to_string();
    }
    marked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tokens: &[&str]) -> HashSet<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn marks_whole_words_case_insensitively() {
        let marked = highlight("Current Address line", &set(&["address"]));
        assert_eq!(marked, "Current <mark>Address</mark> line");
    }

    #[test]
    fn ignores_partial_word_hits() {
        let marked = highlight("addressee", &set(&["address"]));
        assert_eq!(marked, "addressee");
    }

    #[test]
    fn marks_multiple_tokens() {
        let marked = highlight("zip code of your city", &set(&["zip", "city"]));
        assert!(marked.contains("<mark>zip</mark>"));
        assert!(marked.contains("<mark>city</mark>"));
    }
}
