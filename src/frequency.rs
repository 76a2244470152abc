//! Token frequency counting and ranking for bar charts and summaries.

use std::collections::HashMap;

///Counts the occurrences of each token. Returns HashMap<String, u32>, with String being the token and u32 the quantity.
/// # Example
/// ```
/// use text_network::count_tokens;
/// let tokens = vec!["犬".to_string(), "猫".to_string(), "猫".to_string()];
/// let counted = count_tokens(&tokens);
/// assert_eq!(counted["猫"], 2);
/// assert_eq!(counted["犬"], 1);
/// ```
pub fn count_tokens<S: AsRef<str>>(tokens: &[S]) -> HashMap<String, u32> {
    let mut frequency: HashMap<String, u32> = HashMap::new();
    for token in tokens {
        *frequency.entry(token.as_ref().to_owned()).or_insert(0) += 1;
    }
    frequency
}

///Ranks tokens by occurrence count, descending. Ties keep the order in which tokens were first seen.
/// # Example
/// ```
/// use text_network::rank_tokens;
/// let tokens = ["b", "a", "a", "c", "b"];
/// let ranked = rank_tokens(tokens.iter().copied());
/// let expected = vec![
///     ("b".to_string(), 2),
///     ("a".to_string(), 2),
///     ("c".to_string(), 1),
/// ];
/// assert_eq!(ranked, expected);
/// ```
pub fn rank_tokens<'a, I>(tokens: I) -> Vec<(String, u32)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut ranked: Vec<(String, u32)> = Vec::new();
    for token in tokens {
        match index.get(token) {
            Some(&i) => ranked[i].1 += 1,
            None => {
                index.insert(token, ranked.len());
                ranked.push((token.to_owned(), 1));
            }
        }
    }
    // stable sort keeps first-seen order for equal counts
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// The `k` most frequent tokens of a corpus, counted across all documents.
pub fn top_k(corpus: &[Vec<String>], k: usize) -> Vec<(String, u32)> {
    let mut ranked = rank_tokens(corpus.iter().flatten().map(String::as_str));
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count() {
        let words = vec![
            "one".to_string(),
            "two".to_string(),
            "two".to_string(),
            "three".to_string(),
            "three".to_string(),
            "three".to_string(),
        ];
        let counted = count_tokens(&words);
        let mut words_map = HashMap::new();
        words_map.insert("one".to_string(), 1_u32);
        words_map.insert("two".to_string(), 2_u32);
        words_map.insert("three".to_string(), 3_u32);
        assert_eq!(counted, words_map);
    }

    #[test]
    fn ranking_breaks_ties_by_first_occurrence() {
        let ranked = rank_tokens(["満足", "不満", "価格", "不満", "満足", "価格"]);
        let order: Vec<&str> = ranked.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(order, vec!["満足", "不満", "価格"]);
        assert!(ranked.iter().all(|(_, c)| *c == 2));
    }

    #[test]
    fn top_k_flattens_documents_and_truncates() {
        let corpus = vec![
            vec!["駅".to_string(), "近い".to_string()],
            vec![],
            vec!["駅".to_string(), "便利".to_string(), "駅".to_string()],
        ];
        let top = top_k(&corpus, 2);
        assert_eq!(top, vec![("駅".to_string(), 3), ("近い".to_string(), 1)]);
        assert!(top_k(&[], 5).is_empty());
    }
}
