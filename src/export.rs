//! Writing result tables as txt, csv, tsv or json.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::ValueEnum;
use csv::WriterBuilder;
use log::info;
use serde::{Deserialize, Serialize};

use crate::contrast::{ButterflyRow, CharacteristicWord, GroupLabel};
use crate::cooccurrence::{Edge, Graph};
use crate::error::{NetworkError, Result};
use crate::search::SearchHit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Txt,
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

///Neutralizes cells a spreadsheet would evaluate as a formula by prefixing a single quote.
/// # Example
/// ```
/// use text_network::csv_safe_cell;
/// assert_eq!(csv_safe_cell("=SUM(A1)".to_string()), "'=SUM(A1)");
/// assert_eq!(csv_safe_cell("'@ok".to_string()), "'@ok");
/// assert_eq!(csv_safe_cell("駅".to_string()), "駅");
/// ```
pub fn csv_safe_cell(cell: String) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{cell}"),
        _ => cell,
    }
}

/// A row that can be written in every export format.
pub trait ExportRow: Serialize {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub token: String,
    pub count: u32,
}

impl ExportRow for WordCount {
    fn headers() -> &'static [&'static str] {
        &["token", "count"]
    }
    fn cells(&self) -> Vec<String> {
        vec![self.token.clone(), self.count.to_string()]
    }
}

impl ExportRow for Edge {
    fn headers() -> &'static [&'static str] {
        &["source", "target", "weight"]
    }
    fn cells(&self) -> Vec<String> {
        vec![
            self.source.clone(),
            self.target.clone(),
            self.weight.to_string(),
        ]
    }
}

/// Node attributes for a renderer. Label and colour are set in comparison mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRow {
    pub token: String,
    pub degree: usize,
    pub strength: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<GroupLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

impl NodeRow {
    pub fn from_graph(graph: &Graph, label_of: impl Fn(&str) -> Option<GroupLabel>) -> Vec<NodeRow> {
        graph
            .nodes
            .iter()
            .map(|n| {
                let label = label_of(&n.token);
                NodeRow {
                    token: n.token.clone(),
                    degree: n.degree,
                    strength: n.strength,
                    label,
                    color: label.map(GroupLabel::color),
                }
            })
            .collect()
    }
}

impl ExportRow for NodeRow {
    fn headers() -> &'static [&'static str] {
        &["token", "degree", "strength", "label", "color"]
    }
    fn cells(&self) -> Vec<String> {
        vec![
            self.token.clone(),
            self.degree.to_string(),
            self.strength.to_string(),
            self.label.map(|l| l.as_str().to_string()).unwrap_or_default(),
            self.color.unwrap_or_default().to_string(),
        ]
    }
}

impl ExportRow for ButterflyRow {
    fn headers() -> &'static [&'static str] {
        &["token", "count_a", "count_b"]
    }
    fn cells(&self) -> Vec<String> {
        vec![
            self.token.clone(),
            self.count_a.to_string(),
            self.count_b.to_string(),
        ]
    }
}

impl ExportRow for CharacteristicWord {
    fn headers() -> &'static [&'static str] {
        &["token", "size", "label", "color"]
    }
    fn cells(&self) -> Vec<String> {
        vec![
            self.token.clone(),
            self.size.to_string(),
            self.label.as_str().to_string(),
            self.label.color().to_string(),
        ]
    }
}

impl ExportRow for SearchHit {
    fn headers() -> &'static [&'static str] {
        &["row", "column", "snippet"]
    }
    fn cells(&self) -> Vec<String> {
        vec![
            self.row.to_string(),
            self.column.clone(),
            self.snippet.clone(),
        ]
    }
}

/// Writes result tables into one directory under a shared `<stem>_<timestamp>` prefix.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
    prefix: String,
    format: ExportFormat,
}

impl Exporter {
    pub fn new(dir: &Path, stem: &str, format: ExportFormat) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| NetworkError::io(e, dir))?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        Ok(Exporter {
            dir: dir.to_path_buf(),
            prefix: format!("{stem}_{stamp}"),
            format,
        })
    }

    /// Path of table `name` in the configured format.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.prefix, name, self.format.extension()))
    }

    pub fn write<R: ExportRow>(&self, name: &str, rows: &[R]) -> Result<PathBuf> {
        let path = self.path_for(name);
        let file = File::create(&path).map_err(|e| NetworkError::io(e, &path))?;
        let mut out = BufWriter::new(file);
        match self.format {
            ExportFormat::Csv => write_delimited(&mut out, b',', rows)?,
            ExportFormat::Tsv => write_delimited(&mut out, b'\t', rows)?,
            ExportFormat::Json => serde_json::to_writer_pretty(&mut out, rows)?,
            ExportFormat::Txt => write_txt(&mut out, rows).map_err(|e| NetworkError::io(e, &path))?,
        }
        out.flush().map_err(|e| NetworkError::io(e, &path))?;
        info!("wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }
}

fn write_delimited<W: Write, R: ExportRow>(out: W, delimiter: u8, rows: &[R]) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(out);
    wtr.write_record(R::headers())?;
    for row in rows {
        wtr.write_record(row.cells().into_iter().map(csv_safe_cell))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_txt<W: Write, R: ExportRow>(out: &mut W, rows: &[R]) -> std::io::Result<()> {
    writeln!(out, "{}", R::headers().join("\t"))?;
    for row in rows {
        writeln!(out, "{}", row.cells().join("\t"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_prefixes_are_neutralized() {
        for bad in ["=1+1", "+cmd", "-2", "@SUM", "\tx", "\rx"] {
            assert!(csv_safe_cell(bad.to_string()).starts_with('\''));
        }
        assert_eq!(csv_safe_cell(String::new()), "");
    }

    #[test]
    fn csv_rows_are_sanitized() {
        let mut buf = Vec::new();
        let rows = vec![WordCount {
            token: "=HYPERLINK(\"x\")".to_string(),
            count: 3,
        }];
        write_delimited(&mut buf, b',', &rows).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("token,count\n"));
        assert!(out.contains(r#""'=HYPERLINK(""x"")",3"#));
    }

    #[test]
    fn node_rows_carry_label_colours() {
        let graph = crate::cooccurrence::build(
            &[vec!["駅".to_string(), "近い".to_string()]],
            1,
            1,
        )
        .unwrap();
        let rows = NodeRow::from_graph(&graph, |t| (t == "駅").then_some(GroupLabel::A));
        let station = rows.iter().find(|r| r.token == "駅").unwrap();
        assert_eq!(station.color, Some("#66b3ff"));
        assert_eq!(station.cells()[3], "A");
        let near = rows.iter().find(|r| r.token == "近い").unwrap();
        assert_eq!(near.cells()[4], "");
    }

    #[test]
    fn exporter_names_files_with_stem_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path(), "survey", ExportFormat::Json).unwrap();
        let path = exporter
            .write("wordfreq", &[WordCount {
                token: "駅".to_string(),
                count: 2,
            }])
            .unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("survey_"));
        assert!(name.ends_with("_wordfreq.json"));
        let v: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v[0]["token"], "駅");
        assert_eq!(v[0]["count"], 2);
    }
}
