//! Fuzzy resolution of misspelt drug names against the generic vocabulary.
//!
//! Only resolves when confidence is high: edit distance <= 2, the word is at
//! least 5 characters long, and exactly one candidate sits at the best distance.

const MIN_WORD_LEN: usize = 5;
const MAX_DISTANCE: u32 = 2;

/// Closest candidate to `word`, or `None` when no unambiguous match exists.
/// Candidates are compared lowercase.
pub fn closest_term<'a>(word: &str, candidates: &'a [String]) -> Option<&'a str> {
    if word.chars().count() < MIN_WORD_LEN {
        return None;
    }
    let lower = word.to_lowercase();

    let mut best: Option<&str> = None;
    let mut best_distance = MAX_DISTANCE + 1;
    let mut ambiguous = false;

    for term in candidates {
        let term_lower = term.to_lowercase();
        if term_lower == lower {
            return Some(term.as_str());
        }
        let len_diff = lower.chars().count().abs_diff(term_lower.chars().count());
        if len_diff > MAX_DISTANCE as usize {
            continue;
        }

        let dist = edit_distance(&lower, &term_lower);
        if dist < best_distance {
            best_distance = dist;
            best = Some(term.as_str());
            ambiguous = false;
        } else if dist == best_distance && best.is_some() {
            ambiguous = true;
        }
    }

    if ambiguous {
        None
    } else {
        best
    }
}

/// Levenshtein distance over chars, keeping a single row of the table.
fn edit_distance(a: &str, b: &str) -> u32 {
    let target: Vec<char> = b.chars().collect();
    let mut row: Vec<u32> = (0..=target.len() as u32).collect();

    for (i, source_ch) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i as u32 + 1;
        for (j, &target_ch) in target.iter().enumerate() {
            let substitution = diagonal + u32::from(source_ch != target_ch);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(diagonal + 1).min(row[j] + 1);
        }
    }

    row[target.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generics() -> Vec<String> {
        ["paracetamol", "pantoprazole", "metformin", "amlodipine", "atenolol", "amoxicillin"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn resolves_close_misspellings() {
        let g = generics();
        assert_eq!(closest_term("Paracetmol", &g), Some("paracetamol"));
        assert_eq!(closest_term("metfromin", &g), Some("metformin"));
        assert_eq!(closest_term("AMLODIPIN", &g), Some("amlodipine"));
    }

    #[test]
    fn exact_match_returns_candidate() {
        assert_eq!(closest_term("Metformin", &generics()), Some("metformin"));
    }

    #[test]
    fn short_words_never_resolve() {
        assert_eq!(closest_term("pan", &generics()), None);
        assert_eq!(closest_term("dolo", &generics()), None);
    }

    #[test]
    fn distant_words_do_not_resolve() {
        assert_eq!(closest_term("ibuprofen", &generics()), None);
        assert_eq!(closest_term("hospital", &generics()), None);
    }

    #[test]
    fn ties_are_ambiguous() {
        let candidates = vec!["alphaxa".to_string(), "alphaxb".to_string()];
        assert_eq!(closest_term("alphaxc", &candidates), None);
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("pantoprazol", "pantoprazole"), 1);
        assert_eq!(edit_distance("same", "same"), 0);
    }
}
