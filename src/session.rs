//! A loaded table plus the analysis settings that stay fixed between requests.
//!
//! Every request takes a fresh snapshot of the filtered rows and calls the
//! pure builders; the only state kept across requests is the build cache.

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::cache::BuildCache;
use crate::contrast::{
    ButterflyRow, CharacteristicWord, ContrastThresholds, GroupLabel, butterfly,
    characteristic_words, colorize, frequency_table,
};
use crate::cooccurrence::{Graph, validate_parameters};
use crate::error::Result;
use crate::frequency::top_k;
use crate::search::{SearchHit, search};
use crate::table::{RowFilter, Table, apply_filters, record_texts, split_groups, text_columns};
use crate::tokenize::{Analyzer, TokenFilter, tokenize_all};

/// Which attribute to compare on and how to label words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOptions {
    pub column: String,
    /// Empty means the first distinct value.
    pub group_a: Vec<String>,
    /// Empty means "every other value".
    pub group_b: Vec<String>,
    /// Labels for the comparison network.
    pub thresholds: ContrastThresholds,
    /// Labels for the node-only characteristic view.
    pub characteristic_thresholds: ContrastThresholds,
    /// Words taken from each group for the butterfly and characteristic views.
    pub top_words: usize,
}

impl ComparisonOptions {
    pub fn new(column: impl Into<String>, group_a: Vec<String>) -> Self {
        ComparisonOptions {
            column: column.into(),
            group_a,
            group_b: Vec::new(),
            thresholds: ContrastThresholds::RELAXED,
            characteristic_thresholds: ContrastThresholds::STRICT,
            top_words: 15,
        }
    }
}

/// Whole-table analysis of the filtered rows.
#[derive(Debug, Clone)]
pub struct Overview {
    pub records: usize,
    pub words: Vec<(String, u32)>,
    pub graph: Graph,
}

/// Group A versus group B.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub column: String,
    pub values_a: Vec<String>,
    pub values_b: Vec<String>,
    pub records_a: usize,
    pub records_b: usize,
    /// Network over group A records followed by group B records.
    pub graph: Graph,
    pub labels: HashMap<String, GroupLabel>,
    pub butterfly: Vec<ButterflyRow>,
    pub characteristic: Vec<CharacteristicWord>,
}

pub struct Session<A: Analyzer> {
    table: Table,
    analyzer: A,
    filter: TokenFilter,
    cache: BuildCache,
}

impl<A: Analyzer> Session<A> {
    pub fn new(table: Table, analyzer: A, filter: TokenFilter) -> Self {
        Session {
            table,
            analyzer,
            filter,
            cache: BuildCache::new(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn cache(&self) -> &BuildCache {
        &self.cache
    }

    /// Replacing the table drops every cached graph.
    pub fn replace_table(&mut self, table: Table) {
        self.table = table;
        self.cache.invalidate_all();
    }

    /// Rows left after the filters.
    pub fn filtered(&self, filters: &[RowFilter]) -> Result<Table> {
        let t = apply_filters(&self.table, filters)?;
        debug!("{} of {} rows pass the filters", t.len(), self.table.len());
        Ok(t)
    }

    /// One token list per row of `table`.
    pub fn corpus(&self, table: &Table, text_column_names: &[String]) -> Result<Vec<Vec<String>>> {
        let columns = text_columns(table, text_column_names)?;
        let texts = record_texts(table, &columns);
        Ok(tokenize_all(&self.analyzer, &texts, &self.filter))
    }

    pub fn overview(
        &mut self,
        filters: &[RowFilter],
        text_column_names: &[String],
        top_n: usize,
        min_weight: u32,
        top_words: usize,
    ) -> Result<Overview> {
        validate_parameters(top_n, min_weight)?;
        let rows = self.filtered(filters)?;
        if rows.is_empty() {
            warn!("no rows left after filtering");
        }
        let corpus = self.corpus(&rows, text_column_names)?;
        let graph = self.cache.get_or_build(&corpus, top_n, min_weight)?.clone();
        Ok(Overview {
            records: rows.len(),
            words: top_k(&corpus, top_words),
            graph,
        })
    }

    pub fn compare(
        &mut self,
        filters: &[RowFilter],
        text_column_names: &[String],
        top_n: usize,
        min_weight: u32,
        options: &ComparisonOptions,
    ) -> Result<Comparison> {
        validate_parameters(top_n, min_weight)?;
        options.thresholds.validate()?;
        options.characteristic_thresholds.validate()?;
        let rows = self.filtered(filters)?;
        let split = split_groups(&rows, &options.column, &options.group_a, &options.group_b)?;
        if split.a.is_empty() || split.b.is_empty() {
            warn!(
                "comparison on {} has an empty group ({} vs {} rows)",
                options.column,
                split.a.len(),
                split.b.len()
            );
        }

        let corpus_a = self.corpus(&split.a, text_column_names)?;
        let corpus_b = self.corpus(&split.b, text_column_names)?;
        let freq_a = frequency_table(&corpus_a);
        let freq_b = frequency_table(&corpus_b);

        let mixed: Vec<Vec<String>> = corpus_a.iter().chain(corpus_b.iter()).cloned().collect();
        let graph = self.cache.get_or_build(&mixed, top_n, min_weight)?.clone();
        let labels = colorize(&graph, &freq_a, &freq_b, options.thresholds)?;

        Ok(Comparison {
            column: options.column.clone(),
            records_a: split.a.len(),
            records_b: split.b.len(),
            values_a: split.values_a,
            values_b: split.values_b,
            butterfly: butterfly(&freq_a, &freq_b, options.top_words),
            characteristic: characteristic_words(
                &freq_a,
                &freq_b,
                options.top_words,
                options.characteristic_thresholds,
            )?,
            graph,
            labels,
        })
    }

    /// Keyword hits in the text columns of the filtered rows.
    pub fn search(
        &self,
        filters: &[RowFilter],
        text_column_names: &[String],
        keyword: &str,
        context_chars: usize,
    ) -> Result<Vec<SearchHit>> {
        let rows = self.filtered(filters)?;
        let columns = text_columns(&rows, text_column_names)?;
        Ok(search(&rows, &columns, keyword, context_chars))
    }
}
