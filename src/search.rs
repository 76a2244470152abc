//! Full-text keyword search over record texts.

use serde::Serialize;

use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Row index within the searched table.
    pub row: usize,
    pub column: String,
    /// Text around the first match, with `…` where it was cut.
    pub snippet: String,
}

///Finds rows whose `columns` contain `keyword`, ignoring case. One hit per matching cell.
/// # Example
/// ```
/// use text_network::{search, Table};
/// let t = Table::new(
///     vec!["感想".to_string()],
///     vec![vec!["駅が近くて便利".to_string()], vec!["価格が高い".to_string()]],
/// );
/// let hits = search(&t, &[0], "便利", 2);
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].snippet, "…くて便利");
/// ```
pub fn search(table: &Table, columns: &[usize], keyword: &str, context_chars: usize) -> Vec<SearchHit> {
    let needle: Vec<char> = keyword.trim().chars().map(fold).collect();
    if needle.is_empty() {
        return Vec::new();
    }
    let mut hits = Vec::new();
    for (row_index, row) in table.rows.iter().enumerate() {
        for &c in columns {
            let text: Vec<char> = row[c].chars().collect();
            if let Some(at) = find_chars(&text, &needle) {
                hits.push(SearchHit {
                    row: row_index,
                    column: table.headers[c].clone(),
                    snippet: snippet(&text, at, needle.len(), context_chars),
                });
            }
        }
    }
    hits
}

// `needle` must already be folded.
fn find_chars(text: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > text.len() {
        return None;
    }
    let folded: Vec<char> = text.iter().map(|&c| fold(c)).collect();
    folded.windows(needle.len()).position(|w| w == needle)
}

/// Lowercases `c` when that yields a single char. Keyword and text share
/// this folding so one text char always lines up with one needle char.
fn fold(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Start of the context window, never below 0.
fn window_start(index: usize, context: usize) -> usize {
    index.saturating_sub(context)
}

/// End of the context window, never past `max_len`.
fn window_end(index: usize, context: usize, max_len: usize) -> usize {
    (index + context).min(max_len)
}

fn snippet(text: &[char], at: usize, len: usize, context: usize) -> String {
    let start = window_start(at, context);
    let end = window_end(at + len, context, text.len());
    let mut out = String::new();
    if start > 0 {
        out.push('…');
    }
    out.extend(&text[start..end]);
    if end < text.len() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["q1".to_string(), "q2".to_string()],
            vec![
                vec!["Wi-Fiが遅い".to_string(), "スタッフが親切".to_string()],
                vec!["朝食がおいしい".to_string(), "WI-FIは快適".to_string()],
                vec!["".to_string(), "特になし".to_string()],
            ],
        )
    }

    #[test]
    fn case_insensitive_across_columns() {
        let hits = search(&table(), &[0, 1], "wi-fi", 50);
        assert_eq!(hits.len(), 2);
        assert_eq!((hits[0].row, hits[0].column.as_str()), (0, "q1"));
        assert_eq!((hits[1].row, hits[1].column.as_str()), (1, "q2"));
        assert_eq!(hits[1].snippet, "WI-FIは快適");
    }

    #[test]
    fn only_requested_columns_are_searched() {
        assert!(search(&table(), &[0], "親切", 5).is_empty());
        assert_eq!(search(&table(), &[1], "親切", 5).len(), 1);
    }

    #[test]
    fn keyword_and_text_fold_alike() {
        let t = Table::new(
            vec!["comment".to_string()],
            vec![vec!["İstanbul hotel".to_string()]],
        );
        assert_eq!(search(&t, &[0], "İstanbul", 5).len(), 1);
        let hits = search(&t, &[0], "İSTANBUL", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].snippet, "İstanbul hote…");
    }

    #[test]
    fn blank_keyword_matches_nothing() {
        assert!(search(&table(), &[0, 1], "  ", 5).is_empty());
    }

    #[test]
    fn snippet_window_is_clamped() {
        let text: Vec<char> = "0123456789".chars().collect();
        assert_eq!(snippet(&text, 0, 1, 2), "012…");
        assert_eq!(snippet(&text, 5, 1, 2), "…34567…");
        assert_eq!(snippet(&text, 9, 1, 3), "…6789");
        assert_eq!(window_start(1, 5), 0);
        assert_eq!(window_end(8, 5, 9), 9);
    }
}
