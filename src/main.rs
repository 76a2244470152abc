#![forbid(unsafe_code)]
//! # text_network CLI
//!
//! Command-line interface for the `text_network` crate. It loads a survey
//! spreadsheet (`.csv` or `.xlsx`), tokenizes the free-text columns and
//! exports word rankings and co-occurrence networks.
//!
//! ## Features
//! - Automatic text/attribute column detection, or explicit `--text-column`.
//! - Row filters on attribute columns (`--filter 年代=20代,30代`).
//! - Group comparison with node labelling (`--group-by`, `--group-a`, `--group-b`).
//! - Keyword search with context snippets.
//! - Export as txt, csv, tsv or json.
//!
//! Text is expected to be segmented into words already (space separated,
//! optionally tagged `word/品詞`).
//!
//! ## Example
//! ```bash
//! cargo run --release -- answers.csv --top-n 60 --min-weight 2 --export-format csv
//! ```

use clap::{Parser, ValueEnum};
use log::error;
use std::path::PathBuf;
use std::process;
use text_network::{
    AnalysisOptions, ComparisonOptions, ContrastThresholds, ExportFormat, RowFilter, Result,
    analyze_path, load_stopwords, parse_stopword_input,
};

#[derive(Clone, Copy, ValueEnum)]
enum Contrast {
    /// 0.7 / 0.3
    Strict,
    /// 0.6 / 0.4
    Relaxed,
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Spreadsheet to analyze (.csv or .xlsx)
    path: PathBuf,

    /// Optional stopword file (words separated by spaces or newlines)
    #[arg(long)]
    stopwords: Option<PathBuf>,

    /// Extra stopwords, space separated (full-width spaces allowed)
    #[arg(long)]
    exclude: Option<String>,

    /// Column to analyze; repeat for several. Default: auto-detect
    #[arg(long = "text-column")]
    text_columns: Vec<String>,

    /// Keep only rows where COLUMN has one of the values: COLUMN=v1,v2
    #[arg(long = "filter")]
    filters: Vec<RowFilter>,

    /// Maximum number of co-occurrence edges
    #[arg(long, default_value_t = 60)]
    top_n: usize,

    /// Minimum co-occurrence count for an edge
    #[arg(long, default_value_t = 2)]
    min_weight: u32,

    /// Number of words in the frequency ranking
    #[arg(long, default_value_t = 20)]
    top_words: usize,

    /// Attribute column to compare groups on
    #[arg(long)]
    group_by: Option<String>,

    /// Values forming group A (comma separated). Default: the first value
    #[arg(long, value_delimiter = ',', requires = "group_by")]
    group_a: Vec<String>,

    /// Values forming group B (comma separated). Default: all other values
    #[arg(long, value_delimiter = ',', requires = "group_by")]
    group_b: Vec<String>,

    /// Threshold preset for labelling nodes in comparison mode
    #[arg(long, value_enum, default_value = "relaxed")]
    contrast: Contrast,

    /// Threshold preset for the characteristic word table
    #[arg(long, value_enum, default_value = "strict")]
    characteristic_contrast: Contrast,

    /// Override the upper ratio threshold (word belongs to group A above it)
    #[arg(long, requires = "low")]
    high: Option<f64>,

    /// Override the lower ratio threshold (word belongs to group B below it)
    #[arg(long, requires = "high")]
    low: Option<f64>,

    /// Keyword to search for in the text columns
    #[arg(long)]
    search: Option<String>,

    /// Characters of context around a search match
    #[arg(long, default_value_t = 20)]
    context: usize,

    /// Output format for export (txt, csv, tsv, json)
    #[arg(long, default_value = "txt")]
    export_format: ExportFormat,

    /// Directory for exported files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

impl Contrast {
    fn thresholds(self) -> ContrastThresholds {
        match self {
            Contrast::Strict => ContrastThresholds::STRICT,
            Contrast::Relaxed => ContrastThresholds::RELAXED,
        }
    }
}

impl Cli {
    fn into_options(self) -> Result<(PathBuf, PathBuf, AnalysisOptions)> {
        let mut stopwords = Vec::new();
        if let Some(file) = &self.stopwords {
            stopwords.extend(load_stopwords(file)?);
        }
        if let Some(words) = &self.exclude {
            stopwords.extend(parse_stopword_input(words));
        }

        let thresholds = match (self.high, self.low) {
            (Some(high), Some(low)) => ContrastThresholds::new(high, low)?,
            _ => self.contrast.thresholds(),
        };
        let characteristic_thresholds = self.characteristic_contrast.thresholds();
        let comparison = self.group_by.map(|column| ComparisonOptions {
            thresholds,
            characteristic_thresholds,
            group_b: self.group_b,
            ..ComparisonOptions::new(column, self.group_a)
        });

        let opts = AnalysisOptions {
            top_n: self.top_n,
            min_weight: self.min_weight,
            top_words: self.top_words,
            export_format: self.export_format,
            text_columns: self.text_columns,
            filters: self.filters,
            comparison,
            search: self.search,
            context_chars: self.context,
            stopwords,
        };
        Ok((self.path, self.out_dir, opts))
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let (path, out_dir, opts) = match cli.into_options() {
        Ok(parts) => parts,
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    };

    match analyze_path(&path, &opts, &out_dir) {
        Ok(report) => {
            println!("{}", report.summary);
        }
        Err(e) => {
            error!("Error analyzing {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}
