//! Approximate partial matching.
//!
//! `similarity` slides the shorter string over every equal-length window of the
//! longer one and keeps the best normalized Levenshtein score, so an exact
//! substring scores 100 regardless of the surrounding text.
//!
//! `containment` is the one-way variant used for trigger phrases: only the
//! phrase is slid over the query. A query shorter than the phrase is scored as
//! a whole, so "permiso" alone never reaches "permiso por luto".

use strsim::normalized_levenshtein;

use crate::text::normalize;

pub const DEFAULT_RULE_THRESHOLD: u8 = 85;

/// Below this length a partial hit is too cheap ("no" inside "no marque"),
/// so the whole-string ratio is used instead.
const MIN_PARTIAL_CHARS: usize = 4;

pub fn similarity(a: &str, b: &str) -> u8 {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    best_window(short, long)
}

/// How well `phrase` fits somewhere inside `query`.
pub fn containment(query: &str, phrase: &str) -> u8 {
    let query = query.chars().collect::<Vec<_>>();
    let phrase = phrase.chars().collect::<Vec<_>>();
    if query.is_empty() || phrase.is_empty() {
        return 0;
    }

    if query.len() < phrase.len() {
        return whole_ratio(&query, &phrase);
    }
    best_window(&phrase, &query)
}

/// Highest containment of any normalized phrase in the normalized query.
pub fn best_score<S: AsRef<str>>(query: &str, phrases: &[S]) -> u8 {
    let query = normalize(query);
    phrases
        .iter()
        .map(|phrase| containment(&query, &normalize(phrase.as_ref())))
        .max()
        .unwrap_or(0)
}

/// True when some phrase reaches `threshold` inside the query.
pub fn matches_any<S: AsRef<str>>(query: &str, phrases: &[S], threshold: u8) -> bool {
    !phrases.is_empty() && best_score(query, phrases) >= threshold
}

fn best_window(needle: &[char], haystack: &[char]) -> u8 {
    if needle.len() < MIN_PARTIAL_CHARS {
        return whole_ratio(needle, haystack);
    }

    let needle_text = needle.iter().collect::<String>();
    let mut best = 0.0_f64;
    for window in haystack.windows(needle.len()) {
        let window = window.iter().collect::<String>();
        let score = normalized_levenshtein(&needle_text, &window);
        if score > best {
            best = score;
            if best >= 1.0 {
                break;
            }
        }
    }

    to_score(best)
}

fn whole_ratio(a: &[char], b: &[char]) -> u8 {
    let a = a.iter().collect::<String>();
    let b = b.iter().collect::<String>();
    to_score(normalized_levenshtein(&a, &b))
}

fn to_score(ratio: f64) -> u8 {
    (ratio.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::{best_score, containment, matches_any, similarity, DEFAULT_RULE_THRESHOLD};

    #[test]
    fn exact_substring_scores_full() {
        assert_eq!(similarity("no marque", "ayer no marque mi salida"), 100);
        assert_eq!(similarity("ayer no marque mi salida", "no marque"), 100);
    }

    #[test]
    fn identical_inputs_are_deterministic() {
        let first = similarity("vacaciones pendientes", "vacasiones");
        let second = similarity("vacaciones pendientes", "vacasiones");
        assert_eq!(first, second);
        assert_eq!(similarity("boleta", "boleta"), 100);
    }

    #[test]
    fn typo_tolerant_but_below_exact() {
        let score = similarity("vacasiones", "quiero mis vacaciones");
        assert!(score >= 85 && score < 100, "score was {score}");
    }

    #[test]
    fn unrelated_text_scores_low() {
        assert!(similarity("zzz qqq", "licencia por maternidad") < 40);
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(similarity("", "permiso"), 0);
        assert_eq!(similarity("permiso", ""), 0);
    }

    #[test]
    fn very_short_strings_use_whole_ratio() {
        assert!(similarity("no", "no marque") < 50);
        assert_eq!(similarity("eps", "eps"), 100);
    }

    #[test]
    fn matches_any_normalizes_both_sides() {
        assert!(matches_any("Olvidé MARCAR hoy", &["olvide marcar"], DEFAULT_RULE_THRESHOLD));
        assert!(!matches_any("quiero un aumento", &["olvide marcar"], DEFAULT_RULE_THRESHOLD));
        assert!(!matches_any::<&str>("olvide marcar", &[], 0));
        assert!(!matches_any("permiso", &["permiso por luto"], DEFAULT_RULE_THRESHOLD));
    }

    #[test]
    fn containment_only_slides_the_phrase() {
        assert_eq!(containment("ayer no marque mi salida", "no marque"), 100);
        assert!(containment("permiso", "permiso por luto") < DEFAULT_RULE_THRESHOLD);
        assert!(containment("licencia", "licencia por luto") < DEFAULT_RULE_THRESHOLD);
        assert!(containment("huella", "no lee mi huella") < DEFAULT_RULE_THRESHOLD);
        assert_eq!(similarity("permiso", "permiso por luto"), 100);
    }

    #[test]
    fn containment_keeps_small_typos_in_short_queries() {
        assert!(containment("falecio", "fallecio") >= DEFAULT_RULE_THRESHOLD);
        assert_eq!(containment("", "duelo"), 0);
    }

    #[test]
    fn best_score_picks_maximum() {
        assert_eq!(best_score("mi boleta de pago", &["sueldo", "boleta de pago"]), 100);
    }
}
