//! In-memory survey tables: loading, column classification, row filters and
//! group splits. Downstream code only ever sees the record texts built here.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};
use crate::office::read_xlsx;

/// Columns with fewer distinct values than this are treated as attributes.
pub const FILTER_CARDINALITY: usize = 50;

/// A rectangular table of string cells. Missing cells are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Pads or truncates every row to the header width and names blank headers.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers: Vec<String> = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| {
                let h = h.trim();
                if h.is_empty() { format!("column_{}", i + 1) } else { h.to_string() }
            })
            .collect();
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Table { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| NetworkError::UnknownColumn(name.to_string()))
    }

    /// Sorted distinct non-empty values of a column.
    pub fn distinct_values(&self, column: usize) -> Vec<String> {
        let mut values: Vec<String> = self
            .rows
            .iter()
            .map(|r| r[column].trim())
            .filter(|v| !v.is_empty())
            .collect::<HashSet<&str>>()
            .into_iter()
            .map(String::from)
            .collect();
        values.sort();
        values
    }

    /// Rows whose `column` value is one of `values`.
    pub fn rows_matching(&self, column: usize, values: &[String]) -> Table {
        let wanted: HashSet<&str> = values.iter().map(String::as_str).collect();
        Table {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| wanted.contains(r[column].trim()))
                .cloned()
                .collect(),
        }
    }
}

/// Loads a `.csv` or `.xlsx` file, chosen by extension.
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => read_csv(path),
        Some("xlsx") => read_xlsx(path),
        _ => Err(NetworkError::UnsupportedInput(path.to_path_buf())),
    }
}

/// Reads a UTF-8 CSV file with a header row. Ragged rows are allowed.
pub fn read_csv(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|e| NetworkError::io(e, path))?;
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(String::from).collect());
    }
    debug!("read {} rows x {} columns from {}", rows.len(), headers.len(), path.display());
    Ok(Table::new(headers, rows))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Low-cardinality attribute usable for filtering and grouping.
    Filter,
    /// Free text to analyze.
    Text,
    /// High-cardinality numeric data.
    Other,
}

///Tags each column: fewer than 50 distinct values is a filter, otherwise text unless every value is numeric.
pub fn classify_columns(table: &Table) -> Vec<(String, ColumnKind)> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let distinct = table.distinct_values(i);
            let kind = if distinct.len() < FILTER_CARDINALITY {
                ColumnKind::Filter
            } else if distinct.iter().all(|v| v.parse::<f64>().is_ok()) {
                ColumnKind::Other
            } else {
                ColumnKind::Text
            };
            (name.clone(), kind)
        })
        .collect()
}

/// Indices of the columns to analyze: the named override if given, otherwise
/// the text columns, otherwise every column.
pub fn text_columns(table: &Table, overrides: &[String]) -> Result<Vec<usize>> {
    if !overrides.is_empty() {
        return overrides.iter().map(|c| table.column_index(c)).collect();
    }
    let text: Vec<usize> = classify_columns(table)
        .iter()
        .enumerate()
        .filter(|(_, (_, kind))| *kind == ColumnKind::Text)
        .map(|(i, _)| i)
        .collect();
    if text.is_empty() {
        Ok((0..table.headers.len()).collect())
    } else {
        Ok(text)
    }
}

/// One record's text: the non-empty cells of `columns` joined by spaces.
pub fn record_texts(table: &Table, columns: &[usize]) -> Vec<String> {
    table
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|&c| row[c].trim())
                .filter(|v| !v.is_empty())
                .collect::<Vec<&str>>()
                .join(" ")
        })
        .collect()
}

/// Keep rows whose `column` is one of `values`. No values means no filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub values: Vec<String>,
}

impl FromStr for RowFilter {
    type Err = NetworkError;

    /// `column=value1,value2`
    fn from_str(s: &str) -> Result<Self> {
        let (column, values) = s.split_once('=').ok_or_else(|| {
            NetworkError::InvalidParameter(format!("filter must look like column=v1,v2: {s}"))
        })?;
        let column = column.trim();
        if column.is_empty() {
            return Err(NetworkError::InvalidParameter(format!(
                "filter has no column name: {s}"
            )));
        }
        Ok(RowFilter {
            column: column.to_string(),
            values: values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect(),
        })
    }
}

pub fn apply_filters(table: &Table, filters: &[RowFilter]) -> Result<Table> {
    let mut current = table.clone();
    for filter in filters {
        let column = current.column_index(&filter.column)?;
        if !filter.values.is_empty() {
            current = current.rows_matching(column, &filter.values);
        }
    }
    Ok(current)
}

/// Two row groups taken from one attribute column.
#[derive(Debug, Clone)]
pub struct GroupSplit {
    pub values_a: Vec<String>,
    pub values_b: Vec<String>,
    pub a: Table,
    pub b: Table,
}

///Splits rows by the values of `column`. An empty `values_a` means the first distinct value.
///When `values_b` is empty, group B is every other value, or the last value if A already holds them all.
pub fn split_groups(
    table: &Table,
    column: &str,
    values_a: &[String],
    values_b: &[String],
) -> Result<GroupSplit> {
    let index = table.column_index(column)?;
    let distinct = table.distinct_values(index);
    let values_a: Vec<String> = match (values_a.is_empty(), distinct.first()) {
        (false, _) => values_a.to_vec(),
        (true, Some(first)) => vec![first.clone()],
        (true, None) => {
            return Err(NetworkError::InvalidParameter(format!(
                "column {column} has no values to form group A"
            )));
        }
    };
    let values_b: Vec<String> = if values_b.is_empty() {
        let others: Vec<String> = distinct
            .iter()
            .filter(|v| !values_a.contains(v))
            .cloned()
            .collect();
        match (others.is_empty(), distinct.last()) {
            (true, Some(last)) => vec![last.clone()],
            _ => others,
        }
    } else {
        values_b.to_vec()
    };
    if values_b.is_empty() {
        return Err(NetworkError::InvalidParameter(format!(
            "column {column} has no values to form group B"
        )));
    }
    Ok(GroupSplit {
        a: table.rows_matching(index, &values_a),
        b: table.rows_matching(index, &values_b),
        values_a,
        values_b,
    })
}
