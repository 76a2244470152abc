#![forbid(unsafe_code)]
//! # text_network
//!
//! Word co-occurrence networks for Japanese free-text survey responses.
//!
//! The core is three pure functions over tokenized documents:
//! - [`build`]: weighted co-occurrence graph of the strongest token pairs.
//! - [`colorize`]: label each node by the group (A, B or common) it is characteristic of.
//! - [`rank_tokens`]: token frequency ranking.
//!
//! Around them sit spreadsheet loading (`.csv`, `.xlsx`), column
//! classification, row filters, group comparison, keyword search and export.
//! Morphological analysis is external and plugs in through [`Analyzer`].
//!
//! ## Example
//! ```
//! use text_network::build;
//! let corpus = vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]];
//! let graph = build(&corpus, 3, 1).unwrap();
//! assert_eq!(graph.node_count(), 3);
//! assert_eq!(graph.edge_count(), 3);
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

pub mod cache;
pub mod contrast;
pub mod cooccurrence;
pub mod error;
pub mod export;
pub mod frequency;
pub mod office;
pub mod search;
pub mod session;
pub mod table;
pub mod tokenize;

pub use cache::{BuildCache, content_key};
pub use contrast::{
    ButterflyRow, CharacteristicWord, ContrastThresholds, EPSILON, GroupLabel, butterfly,
    characteristic_words, colorize, frequency_table,
};
pub use cooccurrence::{Edge, Graph, Node, build, pair_frequencies, validate_parameters};
pub use error::{NetworkError, Result};
pub use export::{ExportFormat, ExportRow, Exporter, NodeRow, WordCount, csv_safe_cell};
pub use frequency::{count_tokens, rank_tokens, top_k};
pub use office::read_xlsx;
pub use search::{SearchHit, search};
pub use session::{Comparison, ComparisonOptions, Overview, Session};
pub use table::{
    ColumnKind, GroupSplit, RowFilter, Table, apply_filters, classify_columns, load_table,
    read_csv, record_texts, split_groups, text_columns,
};
pub use tokenize::{
    Analyzer, DEFAULT_STOPWORDS, Morpheme, PartOfSpeech, TokenFilter, WhitespaceAnalyzer,
    is_japanese_char, load_stopwords, parse_stopword_input, tokenize, tokenize_all,
};

/// Settings for one run of [`analyze_path`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Maximum number of co-occurrence edges.
    pub top_n: usize,
    /// Minimum pair count for an edge.
    pub min_weight: u32,
    /// Length of the word ranking.
    pub top_words: usize,
    pub export_format: ExportFormat,
    /// Columns to analyze. Empty means auto-detected text columns.
    pub text_columns: Vec<String>,
    pub filters: Vec<RowFilter>,
    pub comparison: Option<ComparisonOptions>,
    pub search: Option<String>,
    /// Characters shown on each side of a search match.
    pub context_chars: usize,
    /// Stopwords added to the defaults.
    pub stopwords: Vec<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            top_n: 60,
            min_weight: 2,
            top_words: 20,
            export_format: ExportFormat::Txt,
            text_columns: Vec::new(),
            filters: Vec::new(),
            comparison: None,
            search: None,
            context_chars: 20,
            stopwords: Vec::new(),
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Human-readable summary, printed by the CLI.
    pub summary: String,
    pub written: Vec<PathBuf>,
    pub overview: Overview,
    pub comparison: Option<Comparison>,
    pub hits: Vec<SearchHit>,
}

///Loads a spreadsheet, runs the analyses selected in `opts` and writes the result tables into `out_dir`.
///Parameters are validated before the file is read.
pub fn analyze_path(path: &Path, opts: &AnalysisOptions, out_dir: &Path) -> Result<AnalysisReport> {
    validate_parameters(opts.top_n, opts.min_weight)?;
    if let Some(cmp) = &opts.comparison {
        cmp.thresholds.validate()?;
        cmp.characteristic_thresholds.validate()?;
    }

    let table = load_table(path)?;
    let filter = TokenFilter::with_defaults(opts.stopwords.iter().cloned());
    info!(
        "loaded {} rows from {} ({} stopwords)",
        table.len(),
        path.display(),
        filter.stopword_count()
    );
    let total = table.len();
    let mut session = Session::new(table, WhitespaceAnalyzer, filter);

    let overview = session.overview(
        &opts.filters,
        &opts.text_columns,
        opts.top_n,
        opts.min_weight,
        opts.top_words,
    )?;
    let comparison = match &opts.comparison {
        Some(cmp) => Some(session.compare(
            &opts.filters,
            &opts.text_columns,
            opts.top_n,
            opts.min_weight,
            cmp,
        )?),
        None => None,
    };
    let hits = match &opts.search {
        Some(keyword) => session.search(
            &opts.filters,
            &opts.text_columns,
            keyword,
            opts.context_chars,
        )?,
        None => Vec::new(),
    };

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("survey");
    let exporter = Exporter::new(out_dir, stem, opts.export_format)?;
    let mut written = Vec::new();

    let words: Vec<WordCount> = overview
        .words
        .iter()
        .map(|(token, count)| WordCount {
            token: token.clone(),
            count: *count,
        })
        .collect();
    written.push(exporter.write("wordfreq", &words)?);
    written.push(exporter.write("edges", &overview.graph.edges)?);
    written.push(exporter.write("nodes", &NodeRow::from_graph(&overview.graph, |_| None))?);

    if let Some(c) = &comparison {
        written.push(exporter.write("compare_edges", &c.graph.edges)?);
        let nodes = NodeRow::from_graph(&c.graph, |t| c.labels.get(t).copied());
        written.push(exporter.write("compare_nodes", &nodes)?);
        written.push(exporter.write("butterfly", &c.butterfly)?);
        written.push(exporter.write("characteristic", &c.characteristic)?);
    }
    if opts.search.is_some() {
        written.push(exporter.write("search", &hits)?);
    }

    let summary = summarize(total, &overview, comparison.as_ref(), opts, &hits);
    Ok(AnalysisReport {
        summary,
        written,
        overview,
        comparison,
        hits,
    })
}

/// Text shown after a run: record counts, top words, co-occurrences, then
/// comparison and search sections when requested.
pub fn summarize(
    total: usize,
    overview: &Overview,
    comparison: Option<&Comparison>,
    opts: &AnalysisOptions,
    hits: &[SearchHit],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Records: {} of {}", overview.records, total);
    if overview.records == 0 {
        let _ = writeln!(out, "No records match the filters.");
    }

    let _ = writeln!(out, "\nTop {} words:", opts.top_words);
    for (token, count) in &overview.words {
        let _ = writeln!(out, "  {token}\t{count}");
    }

    let _ = writeln!(
        out,
        "\nTop {} co-occurrences (min weight {}):",
        opts.top_n, opts.min_weight
    );
    write_edges(&mut out, &overview.graph);

    if let Some(c) = comparison {
        let _ = writeln!(
            out,
            "\nComparison on {}: A={:?} ({} records) vs B={:?} ({} records)",
            c.column, c.values_a, c.records_a, c.values_b, c.records_b
        );
        write_edges(&mut out, &c.graph);
        let _ = writeln!(out, "\nNode groups:");
        for node in &c.graph.nodes {
            if let Some(label) = c.labels.get(&node.token) {
                let _ = writeln!(out, "  {}\t{}", node.token, label.as_str());
            }
        }
        let _ = writeln!(out, "\nA vs B word counts:");
        for row in &c.butterfly {
            let _ = writeln!(out, "  {}\t{}\t{}", row.token, row.count_a, row.count_b);
        }
    }

    if let Some(keyword) = &opts.search {
        let _ = writeln!(out, "\nSearch \"{}\": {} hits", keyword, hits.len());
        for hit in hits {
            let _ = writeln!(out, "  row {} [{}] {}", hit.row, hit.column, hit.snippet);
        }
    }
    out
}

fn write_edges(out: &mut String, graph: &Graph) {
    if graph.is_empty() {
        let _ = writeln!(out, "  No connections found.");
        return;
    }
    for edge in &graph.edges {
        let _ = writeln!(out, "  ({}, {})\t{}", edge.source, edge.target, edge.weight);
    }
}
