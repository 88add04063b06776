//! Fuzzy table-name matching for "did you mean" hints.

/// Edit distance between two strings, counted in chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Up to `limit` candidates that look like `target`, closest first.
///
/// A candidate matches when its edit distance is within a third of the
/// target's length (at least 2), or when one name contains the other.
/// Comparison ignores ASCII case.
pub fn similar_names<'a, I>(target: &str, candidates: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let target = target.to_uppercase();
    if target.is_empty() || limit == 0 {
        return Vec::new();
    }
    let threshold = (target.chars().count() / 3).max(2);

    let mut scored: Vec<(usize, String)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let upper = candidate.to_uppercase();
            if upper == target {
                return None;
            }
            let distance = levenshtein(&target, &upper);
            let contains = upper.len() >= 3
                && target.len() >= 3
                && (upper.contains(&target) || target.contains(&upper));
            (distance <= threshold || contains).then_some((distance, upper))
        })
        .collect();

    scored.sort();
    scored.dedup_by(|a, b| a.1 == b.1);
    scored.into_iter().take(limit).map(|(_, name)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("ORDERS", "ORDERS"), 0);
        assert_eq!(levenshtein("ORDRS", "ORDERS"), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn test_similar_names_orders_by_distance() {
        let tables = ["CUSTOMERS", "ORDERS", "ORDER_ITEMS", "PRODUCTS"];
        let hints = similar_names("ordrs", tables, 3);
        assert_eq!(hints.first().map(String::as_str), Some("ORDERS"));
        assert!(!hints.contains(&"PRODUCTS".to_string()));
    }

    #[test]
    fn test_similar_names_containment() {
        let tables = ["CUSTOMER_ADDRESSES", "INVOICES"];
        let hints = similar_names("CUSTOMER", tables, 3);
        assert_eq!(hints, vec!["CUSTOMER_ADDRESSES".to_string()]);
    }

    #[test]
    fn test_similar_names_limit_and_exact() {
        let tables = ["T1", "T2", "T3", "T4", "T"];
        let hints = similar_names("T", tables, 3);
        assert_eq!(hints.len(), 3);
        assert!(!hints.contains(&"T".to_string()));
    }

    #[test]
    fn test_similar_names_nothing_close() {
        let hints = similar_names("INVENTORY", ["CUSTOMERS", "ORDERS"], 3);
        assert!(hints.is_empty());
    }
}
