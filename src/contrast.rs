//! Group contrast: which of two corpora a word is characteristic of.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::cooccurrence::Graph;
use crate::error::{NetworkError, Result};
use crate::frequency::count_tokens;

/// Keeps the ratio defined when a token is absent from both tables.
pub const EPSILON: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupLabel {
    A,
    B,
    #[serde(rename = "common")]
    Common,
}

impl GroupLabel {
    /// Hex colour used by the dashboard: blue for A, red for B, grey otherwise.
    pub fn color(self) -> &'static str {
        match self {
            GroupLabel::A => "#66b3ff",
            GroupLabel::B => "#ff9999",
            GroupLabel::Common => "#dddddd",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupLabel::A => "A",
            GroupLabel::B => "B",
            GroupLabel::Common => "common",
        }
    }
}

/// Ratio cut-offs for labelling. `low < high`, both strictly inside (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrastThresholds {
    pub high: f64,
    pub low: f64,
}

impl ContrastThresholds {
    /// 0.7 / 0.3, the default for the node-only characteristic view.
    pub const STRICT: ContrastThresholds = ContrastThresholds {
        high: 0.7,
        low: 0.3,
    };
    /// 0.6 / 0.4, the default for labelling the comparison network.
    pub const RELAXED: ContrastThresholds = ContrastThresholds {
        high: 0.6,
        low: 0.4,
    };

    pub fn new(high: f64, low: f64) -> Result<Self> {
        let t = ContrastThresholds { high, low };
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| v > 0.0 && v < 1.0;
        if !in_range(self.high) || !in_range(self.low) {
            return Err(NetworkError::InvalidParameter(format!(
                "contrast thresholds must lie in (0, 1), got high={} low={}",
                self.high, self.low
            )));
        }
        if self.high <= self.low {
            return Err(NetworkError::InvalidParameter(format!(
                "high threshold ({}) must exceed low threshold ({})",
                self.high, self.low
            )));
        }
        Ok(())
    }

    /// Label from smoothed counts: `a / (a + b + EPSILON)`.
    pub fn label(&self, count_a: u32, count_b: u32) -> GroupLabel {
        let a = f64::from(count_a);
        self.label_ratio(a / (a + f64::from(count_b) + EPSILON))
    }

    /// Share of group A above `high` is A, below `low` is B. The bounds themselves are common.
    pub fn label_ratio(&self, ratio: f64) -> GroupLabel {
        if ratio > self.high {
            GroupLabel::A
        } else if ratio < self.low {
            GroupLabel::B
        } else {
            GroupLabel::Common
        }
    }
}

impl Default for ContrastThresholds {
    fn default() -> Self {
        ContrastThresholds::RELAXED
    }
}

///Labels every node of `graph` by the group it is characteristic of. Edges are not consulted.
/// # Example
/// ```
/// use std::collections::HashMap;
/// use text_network::{build, colorize, ContrastThresholds, GroupLabel};
/// let graph = build(&[vec!["w".to_string(), "v".to_string()]], 1, 1).unwrap();
/// let freq_a = HashMap::from([("w".to_string(), 8), ("v".to_string(), 4)]);
/// let freq_b = HashMap::from([("w".to_string(), 2), ("v".to_string(), 4)]);
/// let labels = colorize(&graph, &freq_a, &freq_b, ContrastThresholds::STRICT).unwrap();
/// assert_eq!(labels["w"], GroupLabel::A);
/// assert_eq!(labels["v"], GroupLabel::Common);
/// ```
pub fn colorize(
    graph: &Graph,
    freq_a: &HashMap<String, u32>,
    freq_b: &HashMap<String, u32>,
    thresholds: ContrastThresholds,
) -> Result<HashMap<String, GroupLabel>> {
    thresholds.validate()?;
    Ok(graph
        .nodes
        .iter()
        .map(|node| {
            let a = freq_a.get(&node.token).copied().unwrap_or(0);
            let b = freq_b.get(&node.token).copied().unwrap_or(0);
            (node.token.clone(), thresholds.label(a, b))
        })
        .collect())
}

/// A word in the node-only comparison view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacteristicWord {
    pub token: String,
    /// Combined count in both groups.
    pub size: u32,
    pub label: GroupLabel,
}

/// Union of each group's `top_k` words, sized by combined count and labelled
/// by the plain share `a / (a + b)`. Words absent from both groups are skipped.
/// Sorted by size descending, then token.
pub fn characteristic_words(
    freq_a: &HashMap<String, u32>,
    freq_b: &HashMap<String, u32>,
    top_k: usize,
    thresholds: ContrastThresholds,
) -> Result<Vec<CharacteristicWord>> {
    thresholds.validate()?;
    let mut words: Vec<CharacteristicWord> = top_union(freq_a, freq_b, top_k)
        .into_iter()
        .filter_map(|token| {
            let a = freq_a.get(&token).copied().unwrap_or(0);
            let b = freq_b.get(&token).copied().unwrap_or(0);
            let size = a + b;
            (size > 0).then(|| CharacteristicWord {
                token,
                size,
                label: thresholds.label_ratio(f64::from(a) / f64::from(size)),
            })
        })
        .collect();
    words.sort_by(|x, y| y.size.cmp(&x.size).then_with(|| x.token.cmp(&y.token)));
    Ok(words)
}

/// One row of the butterfly (back-to-back bar) comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButterflyRow {
    pub token: String,
    pub count_a: u32,
    pub count_b: u32,
}

/// Union of each group's `top_k` words with both counts,
/// sorted by A count desc, B count desc, then token.
pub fn butterfly(
    freq_a: &HashMap<String, u32>,
    freq_b: &HashMap<String, u32>,
    top_k: usize,
) -> Vec<ButterflyRow> {
    let mut rows: Vec<ButterflyRow> = top_union(freq_a, freq_b, top_k)
        .into_iter()
        .map(|token| ButterflyRow {
            count_a: freq_a.get(&token).copied().unwrap_or(0),
            count_b: freq_b.get(&token).copied().unwrap_or(0),
            token,
        })
        .collect();
    rows.sort_by(|x, y| {
        y.count_a
            .cmp(&x.count_a)
            .then_with(|| y.count_b.cmp(&x.count_b))
            .then_with(|| x.token.cmp(&y.token))
    });
    rows
}

fn top_union(freq_a: &HashMap<String, u32>, freq_b: &HashMap<String, u32>, k: usize) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for freq in [freq_a, freq_b] {
        for (token, _) in top_of_table(freq, k) {
            if seen.insert(token.clone()) {
                out.push(token);
            }
        }
    }
    out
}

// HashMap iteration order is random, so order by token before the stable rank.
fn top_of_table(freq: &HashMap<String, u32>, k: usize) -> Vec<(String, u32)> {
    let mut entries: Vec<(&String, &u32)> = freq.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries
        .into_iter()
        .take(k)
        .map(|(t, c)| (t.clone(), *c))
        .collect()
}

/// Token counts of a corpus as a lookup table.
pub fn frequency_table(corpus: &[Vec<String>]) -> HashMap<String, u32> {
    let tokens: Vec<&String> = corpus.iter().flatten().collect();
    count_tokens(&tokens)
}
