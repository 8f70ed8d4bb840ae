//! String metrics shared by the domain and link analyzers.

use std::collections::HashMap;

/// Shannon entropy of the character histogram, in bits.
pub fn shannon_entropy(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for ch in text.chars() {
        *counts.entry(ch).or_insert(0) += 1;
        total += 1;
    }

    let len = total as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Edit distance over chars with unit-cost insertion, deletion and
/// substitution. Transpositions count as two edits.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Number of positions at which two strings differ, compared pairwise up to
/// the shorter length.
pub fn positional_differences(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).filter(|(x, y)| x != y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_entropy_edge_cases() {
        assert!(approx(shannon_entropy(""), 0.0));
        assert!(approx(shannon_entropy("aaaa"), 0.0));
        assert!(approx(shannon_entropy("ab"), 1.0));
        assert!(approx(shannon_entropy("abcd"), 2.0));
    }

    #[test]
    fn test_levenshtein_known_values() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("gooogle", "google"), 1);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
        // Transpositions cost two edits, not one.
        assert_eq!(levenshtein_distance("ab", "ba"), 2);
    }

    #[test]
    fn test_levenshtein_is_a_metric() {
        let words = [
            "",
            "google",
            "gooogle",
            "g00gle",
            "microsoft",
            "rnicrosoft",
            "paypal-security",
            "ünïcödé",
        ];

        for a in &words {
            assert_eq!(levenshtein_distance(a, a), 0);
            for b in &words {
                assert_eq!(levenshtein_distance(a, b), levenshtein_distance(b, a));
                for c in &words {
                    assert!(
                        levenshtein_distance(a, c)
                            <= levenshtein_distance(a, b) + levenshtein_distance(b, c),
                        "triangle inequality failed for {a:?}, {b:?}, {c:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_positional_differences() {
        assert_eq!(positional_differences("google.com", "goog1e.com"), 1);
        assert_eq!(positional_differences("apple", "apple"), 0);
        assert_eq!(positional_differences("abc", "abcd"), 0);
    }
}
