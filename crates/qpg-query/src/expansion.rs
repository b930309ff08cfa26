//! Deterministic query expansion (spec §4.9, §9): a fixed, pure table of
//! rewrites. Identical inputs always yield identical expansions; there is
//! no external service and the rule set is frozen across releases so
//! fusion rankings stay reproducible.

/// Expand `raw` into the terms the hybrid planner searches with: the
/// original query plus lowercase/punctuation-stripped, camelCase-split,
/// and singularized variants (spec §4.9 step 1).
pub fn expand(raw: &str) -> Vec<String> {
    let mut terms = Vec::new();
    push_unique(&mut terms, raw.to_string());

    let folded = fold_case_and_punctuation(raw);
    push_unique(&mut terms, folded.clone());

    for word in folded.split_whitespace() {
        for split_word in split_camel_case(word) {
            push_unique(&mut terms, split_word.clone());
            push_unique(&mut terms, singularize(&split_word));
        }
    }

    terms
}

fn push_unique(terms: &mut Vec<String>, candidate: String) {
    if !candidate.is_empty() && !terms.contains(&candidate) {
        terms.push(candidate);
    }
}

/// Lowercase and replace non-alphanumeric characters with spaces.
fn fold_case_and_punctuation(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split `customerOrders` into `["customer", "orders"]`. Already-lowercase
/// input (the common case after folding) is returned unchanged.
fn split_camel_case(word: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        if c.is_uppercase() && !current.is_empty() {
            parts.push(std::mem::take(&mut current).to_lowercase());
        }
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(current.to_lowercase());
    }
    if parts.len() <= 1 {
        vec![word.to_string()]
    } else {
        parts
    }
}

/// Pinned suffix stemmer for common English plurals (spec §9 Open
/// Question, resolved): `-ies` -> `-y`, `-xes`/`-ses` -> drop `-es`,
/// trailing `-s` -> drop. Words not matching any rule are returned
/// unchanged.
fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
    }
    if word.ends_with("xes") || word.ends_with("ses") {
        return word[..word.len() - 2].to_string();
    }
    if let Some(stem) = word.strip_suffix('s') {
        if !stem.is_empty() && !stem.ends_with('s') {
            return stem.to_string();
        }
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_is_deterministic() {
        assert_eq!(expand("CustomerOrders"), expand("CustomerOrders"));
    }

    #[test]
    fn splits_camel_case_and_singularizes() {
        let terms = expand("customerOrders");
        assert!(terms.contains(&"customer".to_string()));
        assert!(terms.contains(&"orders".to_string()));
        assert!(terms.contains(&"order".to_string()));
    }

    #[test]
    fn singularize_handles_common_suffixes() {
        assert_eq!(singularize("companies"), "company");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("orders"), "order");
    }

    #[test]
    fn singularize_does_not_mangle_already_singular_words() {
        assert_eq!(singularize("address"), "address");
    }
}
