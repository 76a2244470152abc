//! Word co-occurrence network construction.
//!
//! Every document contributes one pair instance per pair of positions holding
//! two different tokens, so a token repeated inside a document is counted once
//! per position. Pairs are unordered: `(x, y)` and `(y, x)` share one counter.
//! The strongest `top_n` pairs are kept, then pairs below `min_weight` are
//! dropped, and the graph is built from what remains.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::error::{NetworkError, Result};

/// An undirected, weighted edge. `source` sorts before `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: u32,
}

/// A node with the statistics a renderer needs for sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub token: String,
    /// Number of retained edges touching this node.
    pub degree: usize,
    /// Sum of the weights of those edges.
    pub strength: u32,
}

/// Result of [`build`]. Edges are ordered by descending weight, nodes by first
/// appearance in the edge list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// An empty graph is a valid "no connections found" result.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains_node(&self, token: &str) -> bool {
        self.nodes.iter().any(|n| n.token == token)
    }

    /// Weight of the edge between `a` and `b`, in either orientation.
    pub fn weight(&self, a: &str, b: &str) -> Option<u32> {
        let (source, target) = ordered(a, b);
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
            .map(|e| e.weight)
    }

    fn from_edges(edges: Vec<Edge>) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut nodes: Vec<Node> = Vec::new();
        for edge in &edges {
            for token in [&edge.source, &edge.target] {
                let i = *index.entry(token.clone()).or_insert_with(|| {
                    nodes.push(Node {
                        token: token.clone(),
                        degree: 0,
                        strength: 0,
                    });
                    nodes.len() - 1
                });
                nodes[i].degree += 1;
                nodes[i].strength += edge.weight;
            }
        }
        Graph { nodes, edges }
    }
}

fn ordered<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Rejects a zero pair ceiling or minimum weight.
pub fn validate_parameters(top_n: usize, min_weight: u32) -> Result<()> {
    if top_n == 0 {
        return Err(NetworkError::InvalidParameter(
            "top_n must be at least 1".to_string(),
        ));
    }
    if min_weight == 0 {
        return Err(NetworkError::InvalidParameter(
            "min_weight must be at least 1".to_string(),
        ));
    }
    Ok(())
}

///Counts unordered token pairs over all documents.
///Returns the pairs in the order they were first generated (document order, then position order), each with its count.
/// # Example
/// ```
/// use text_network::pair_frequencies;
/// let corpus = vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]];
/// let pairs = pair_frequencies(&corpus);
/// assert_eq!(pairs.len(), 3);
/// assert!(pairs.iter().all(|(_, count)| *count == 1));
/// ```
pub fn pair_frequencies(corpus: &[Vec<String>]) -> Vec<((String, String), u32)> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut counted: Vec<((&str, &str), u32)> = Vec::new();

    for document in corpus.iter().filter(|d| d.len() >= 2) {
        for (i, first) in document.iter().enumerate() {
            for second in &document[i + 1..] {
                if first == second {
                    continue; // no self-loops
                }
                let key = ordered(first, second);
                match index.get(&key) {
                    Some(&at) => counted[at].1 += 1,
                    None => {
                        index.insert(key, counted.len());
                        counted.push((key, 1));
                    }
                }
            }
        }
    }

    counted
        .into_iter()
        .map(|((a, b), count)| ((a.to_owned(), b.to_owned()), count))
        .collect()
}

///Builds the co-occurrence graph of the `top_n` most frequent pairs whose count is at least `min_weight`.
/// # Example
/// ```
/// use text_network::build;
/// let corpus = vec![
///     vec!["a".to_string(), "b".to_string()],
///     vec!["a".to_string(), "b".to_string()],
///     vec!["a".to_string(), "c".to_string()],
/// ];
/// let graph = build(&corpus, 2, 2).unwrap();
/// assert_eq!(graph.edge_count(), 1);
/// assert_eq!(graph.weight("b", "a"), Some(2));
/// assert!(!graph.contains_node("c"));
/// ```
pub fn build(corpus: &[Vec<String>], top_n: usize, min_weight: u32) -> Result<Graph> {
    validate_parameters(top_n, min_weight)?;

    let mut pairs = pair_frequencies(corpus);
    let distinct = pairs.len();
    // stable: equal counts keep generation order
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    pairs.truncate(top_n);

    let edges: Vec<Edge> = pairs
        .into_iter()
        .filter(|(_, count)| *count >= min_weight)
        .map(|((source, target), weight)| Edge {
            source,
            target,
            weight,
        })
        .collect();

    debug!(
        "co-occurrence: {} documents, {} distinct pairs, {} edges kept (top_n={}, min_weight={})",
        corpus.len(),
        distinct,
        edges.len(),
        top_n,
        min_weight
    );

    Ok(Graph::from_edges(edges))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|d| d.iter().map(|t| t.to_string()).collect())
            .collect()
    }

    #[test]
    fn single_document_forms_a_triangle() {
        let g = build(&docs(&[&["a", "b", "c"]]), 3, 1).unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 3);
        assert!(g.edges.iter().all(|e| e.weight == 1));
    }

    #[test]
    fn min_weight_drops_weak_pairs_and_their_nodes() {
        let g = build(&docs(&[&["a", "b"], &["a", "b"], &["a", "c"]]), 2, 2).unwrap();
        assert_eq!(g.edges, vec![Edge {
            source: "a".into(),
            target: "b".into(),
            weight: 2
        }]);
        assert!(!g.contains_node("c"));
    }

    #[test]
    fn short_and_empty_corpora_give_empty_graphs() {
        assert!(build(&docs(&[&["x"]]), 10, 1).unwrap().is_empty());
        assert!(build(&[], 10, 1).unwrap().is_empty());
        assert_eq!(build(&[], 10, 1).unwrap(), Graph::default());
    }

    #[test]
    fn zero_parameters_are_rejected() {
        let corpus = docs(&[&["a", "b"]]);
        assert!(matches!(
            build(&corpus, 0, 1),
            Err(NetworkError::InvalidParameter(_))
        ));
        assert!(matches!(
            build(&corpus, 1, 0),
            Err(NetworkError::InvalidParameter(_))
        ));
    }

    #[test]
    fn repeated_token_counts_per_position_without_self_loop() {
        let pairs = pair_frequencies(&docs(&[&["a", "a", "b"]]));
        assert_eq!(pairs, vec![(("a".to_string(), "b".to_string()), 2)]);

        let g = build(&docs(&[&["a", "a", "b"]]), 5, 1).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight("a", "b"), Some(2));
        assert!(g.edges.iter().all(|e| e.source != e.target));
    }

    #[test]
    fn reversed_pairs_share_one_edge() {
        let g = build(&docs(&[&["x", "y"], &["y", "x"]]), 5, 1).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight("x", "y"), Some(2));
        assert_eq!(g.weight("y", "x"), Some(2));
    }

    #[test]
    fn ties_are_cut_in_generation_order() {
        // all pairs have count 1; generation order is (p,q), (p,r), (q,r), (s,t)
        let corpus = docs(&[&["p", "q", "r"], &["s", "t"]]);
        let g = build(&corpus, 2, 1).unwrap();
        let kept: Vec<(&str, &str)> = g
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(kept, vec![("p", "q"), ("p", "r")]);
        assert_eq!(g, build(&corpus, 2, 1).unwrap());
    }

    #[test]
    fn top_n_is_applied_before_min_weight() {
        // {a,b}:3 {c,d}:2 {e,f}:2 -> top 1 keeps only {a,b}
        let corpus = docs(&[
            &["a", "b"],
            &["a", "b"],
            &["a", "b"],
            &["c", "d"],
            &["c", "d"],
            &["e", "f"],
            &["e", "f"],
        ]);
        let g = build(&corpus, 1, 2).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight("a", "b"), Some(3));
    }

    #[test]
    fn structural_properties_hold() {
        let corpus = docs(&[
            &["駅", "近い", "便利", "駅"],
            &["価格", "高い", "駅"],
            &["便利", "駅", "価格", "安い"],
            &["スタッフ", "親切", "便利"],
            &[],
        ]);
        let mut previous = usize::MAX;
        for min_weight in 1..5 {
            let g = build(&corpus, 8, min_weight).unwrap();
            assert!(g.edge_count() <= 8);
            assert!(g.edges.iter().all(|e| e.weight >= min_weight));
            for node in &g.nodes {
                assert!(node.degree > 0);
                assert!(
                    g.edges
                        .iter()
                        .any(|e| e.source == node.token || e.target == node.token)
                );
            }
            let mut seen = std::collections::HashSet::new();
            for e in &g.edges {
                assert!(e.source < e.target);
                assert!(seen.insert((e.source.clone(), e.target.clone())));
            }
            assert!(g.edge_count() <= previous);
            previous = g.edge_count();
        }
    }

    #[test]
    fn node_strength_sums_incident_weights() {
        let g = build(&docs(&[&["a", "b"], &["a", "b"], &["a", "c"]]), 5, 1).unwrap();
        let a = g.nodes.iter().find(|n| n.token == "a").unwrap();
        assert_eq!(a.degree, 2);
        assert_eq!(a.strength, 3);
        assert_eq!(g.nodes[0].token, "a");
    }
}
