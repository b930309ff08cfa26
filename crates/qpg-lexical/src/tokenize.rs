//! Case-folded, unicode-normalized query tokenization.

use unicode_normalization::UnicodeNormalization;

/// Normalize a raw query string: NFKC-normalize, lowercase, and drop
/// punctuation other than the word characters FTS5 tokenizes on its own.
pub fn normalize_query(raw: &str) -> String {
    raw.nfkc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(normalize_query("Customer's Orders!"), "customer s orders");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_query("  foo   bar  "), "foo bar");
    }
}
