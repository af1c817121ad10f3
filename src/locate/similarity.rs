use strsim::levenshtein;

use super::normalize::canonical;

/// Fuzzy similarity between a search string and a candidate text, in [0, 1].
///
/// Precedence: exact match after normalization wins outright (1.0), then
/// substring containment (0.9). Failing both, the score is the better of a
/// token-overlap measure (weight 0.7) and a character-level edit-distance
/// measure (weight 0.6).
pub fn similarity(search: &str, target: &str) -> f64 {
    let s = canonical(search);
    let t = canonical(target);
    if s.is_empty() || t.is_empty() {
        return if s == t { 1.0 } else { 0.0 };
    }
    if s == t {
        return 1.0;
    }
    if t.contains(&s) {
        return 0.9;
    }
    let token = token_overlap(&s, &t) * 0.7;
    let ch = char_similarity(&s, &t) * 0.6;
    token.max(ch)
}

/// Confidence for partial (positional) matches, used by strategies that care
/// where in the candidate the search string appears. Distinct from
/// [`similarity`]: exact 1.0, prefix 0.9, suffix 0.8, interior 0.7. A
/// candidate that does not contain the search at all falls back to the
/// weighted character-level score, which keeps it below every containment
/// tier.
pub fn partial_confidence(search: &str, target: &str) -> f64 {
    let s = canonical(search);
    let t = canonical(target);
    if s.is_empty() || t.is_empty() {
        return 0.0;
    }
    if t == s {
        1.0
    } else if t.starts_with(&s) {
        0.9
    } else if t.ends_with(&s) {
        0.8
    } else if t.contains(&s) {
        0.7
    } else {
        char_similarity(&s, &t) * 0.6
    }
}

/// Fraction of the search's whitespace-split tokens that appear as a
/// substring of some target token.
fn token_overlap(search: &str, target: &str) -> f64 {
    let search_tokens: Vec<&str> = search.split_whitespace().collect();
    if search_tokens.is_empty() {
        return 0.0;
    }
    let target_tokens: Vec<&str> = target.split_whitespace().collect();
    let hits = search_tokens
        .iter()
        .filter(|st| target_tokens.iter().any(|tt| tt.contains(*st)))
        .count();
    hits as f64 / search_tokens.len() as f64
}

/// `1 - levenshtein / max(len)`, on already-normalized input.
fn char_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}
