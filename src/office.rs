use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

use crate::error::{NetworkError, Result};
use crate::table::Table;

/// Reads the first worksheet of an `.xlsx` workbook. The first row is the header.
pub fn read_xlsx(p: &Path) -> Result<Table> {
    let file = File::open(p).map_err(|e| NetworkError::io(e, p))?;
    let mut zip = ZipArchive::new(file)?;

    let shared = match read_entry(&mut zip, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet_name = first_sheet_name(&mut zip)?
        .ok_or_else(|| NetworkError::Spreadsheet("Workbook has no worksheets".to_string()))?;
    let sheet = read_entry(&mut zip, &sheet_name)?
        .ok_or_else(|| NetworkError::Spreadsheet(format!("Missing {sheet_name}")))?;

    let mut grid = parse_sheet_xml(&sheet, &shared)?.into_iter();
    let headers = grid.next().unwrap_or_default();
    Ok(Table::new(headers, grid.collect()))
}

fn read_entry(zip: &mut ZipArchive<File>, name: &str) -> Result<Option<String>> {
    let mut entry = match zip.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| NetworkError::Spreadsheet(format!("Read {name} failed: {e}")))?;
    Ok(Some(xml))
}

/// Part name of the first tab in workbook order. Falls back to the
/// lowest-numbered `xl/worksheets/sheetN.xml` when the workbook parts
/// are missing or point nowhere.
fn first_sheet_name(zip: &mut ZipArchive<File>) -> Result<Option<String>> {
    if let Some(name) = first_sheet_from_workbook(zip)? {
        if zip.file_names().any(|n| n == name) {
            return Ok(Some(name));
        }
    }
    Ok(lowest_numbered_sheet(zip))
}

fn first_sheet_from_workbook(zip: &mut ZipArchive<File>) -> Result<Option<String>> {
    let Some(workbook) = read_entry(zip, "xl/workbook.xml")? else {
        return Ok(None);
    };
    let Some(rels) = read_entry(zip, "xl/_rels/workbook.xml.rels")? else {
        return Ok(None);
    };
    let Some(id) = first_sheet_relationship(&workbook)? else {
        return Ok(None);
    };
    Ok(relationship_target(&rels, &id)?.map(|target| match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }))
}

fn lowest_numbered_sheet(zip: &ZipArchive<File>) -> Option<String> {
    let mut sheets: Vec<(u32, &str)> = zip
        .file_names()
        .filter_map(|n| {
            let number = n
                .strip_prefix("xl/worksheets/sheet")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((number, n))
        })
        .collect();
    sheets.sort();
    sheets.first().map(|(_, n)| n.to_string())
}

// ---- Internal helpers ----

/// Each `<si>` is one string; rich-text runs are concatenated and
/// phonetic (`<rPh>`) runs are skipped.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"si" => current.clear(),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"si" => out.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Empty(e) => {
                if local_name(e.name().as_ref()) == b"si" {
                    out.push(String::new());
                }
            }
            Event::Text(t) => {
                if in_text && !in_phonetic {
                    current.push_str(&t.unescape()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// `r:id` of the first `<sheet>` in `workbook.xml`.
fn first_sheet_relationship(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"sheet" => {
                return attribute(&e, b"id");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// `Target` of the relationship with `Id == id`.
fn relationship_target(xml: &str, id: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"Relationship" => {
                if attribute(&e, b"Id")?.as_deref() == Some(id) {
                    return attribute(&e, b"Target");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

// Matches on the local name, so `r:id` is found as `id`.
fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| NetworkError::Spreadsheet(format!("Bad attribute: {e}")))?;
        if local_name(attr.key.as_ref()) == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

#[derive(Clone, Copy, PartialEq)]
enum CellType {
    Shared,
    Inline,
    Plain,
}

/// Rows of cell values. Cells are placed by their `r` reference so sparse
/// rows keep their columns.
fn parse_sheet_xml(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut column = 0usize;
    let mut cell_type = CellType::Plain;
    let mut value = String::new();
    let mut capture = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"row" => {
                    row = Vec::new();
                    column = 0;
                }
                b"c" => {
                    (column, cell_type) = cell_position(&e, column)?;
                    value.clear();
                }
                b"v" | b"t" => capture = true,
                _ => {}
            },
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"row" => rows.push(std::mem::take(&mut row)),
                b"c" => {
                    let text = match cell_type {
                        CellType::Shared => {
                            let i: usize = value.trim().parse().map_err(|_| {
                                NetworkError::Spreadsheet(format!("Bad shared string index {value:?}"))
                            })?;
                            shared.get(i).cloned().ok_or_else(|| {
                                NetworkError::Spreadsheet(format!("Shared string {i} out of range"))
                            })?
                        }
                        CellType::Inline | CellType::Plain => std::mem::take(&mut value),
                    };
                    place(&mut row, column, text);
                    column += 1;
                }
                b"v" | b"t" => capture = false,
                _ => {}
            },
            Event::Empty(e) => match local_name(e.name().as_ref()) {
                b"row" => rows.push(Vec::new()),
                b"c" => {
                    let (at, _) = cell_position(&e, column)?;
                    column = at + 1;
                }
                _ => {}
            },
            Event::Text(t) => {
                if capture {
                    value.push_str(&t.unescape()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

fn cell_position(e: &BytesStart, fallback: usize) -> Result<(usize, CellType)> {
    let mut column = fallback;
    let mut cell_type = CellType::Plain;
    for attr in e.attributes() {
        let attr = attr.map_err(|e| NetworkError::Spreadsheet(format!("Bad attribute: {e}")))?;
        match attr.key.as_ref() {
            b"r" => {
                if let Some(c) = column_from_reference(&attr.value)? {
                    column = c;
                }
            }
            b"t" => {
                cell_type = match attr.value.as_ref() {
                    b"s" => CellType::Shared,
                    b"inlineStr" => CellType::Inline,
                    _ => CellType::Plain,
                }
            }
            _ => {}
        }
    }
    Ok((column, cell_type))
}

/// Index of column XFD, the last one a worksheet can have.
const MAX_COLUMN: usize = 16_383;

/// `"C12"` -> 2. A reference without letters gives `None`.
fn column_from_reference(reference: &[u8]) -> Result<Option<usize>> {
    let letters: Vec<u8> = reference
        .iter()
        .take_while(|b| b.is_ascii_alphabetic())
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return Ok(None);
    }
    let n = letters.iter().try_fold(0usize, |acc, b| {
        acc.checked_mul(26)?.checked_add(usize::from(b - b'A' + 1))
    });
    match n {
        Some(n) if n - 1 <= MAX_COLUMN => Ok(Some(n - 1)),
        _ => Err(NetworkError::Spreadsheet(format!(
            "Cell reference {} is beyond column XFD",
            String::from_utf8_lossy(reference)
        ))),
    }
}

fn place(row: &mut Vec<String>, column: usize, text: String) {
    if row.len() <= column {
        row.resize(column + 1, String::new());
    }
    row[column] = text;
}

fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b':') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}
