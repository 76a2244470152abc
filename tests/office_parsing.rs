use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use text_network::{AnalysisOptions, ExportFormat, NetworkError, analyze_path, read_xlsx};

fn write_zip(target: &Path, entries: &[(&str, &str)]) {
    let file = File::create(target).expect("create xlsx file");
    let mut zip = ZipWriter::new(file);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, body) in entries {
        zip.start_file(*name, deflated).expect("start entry");
        zip.write_all(body.as_bytes()).expect("write entry");
    }
    zip.finish().expect("finish xlsx zip");
}

fn write_minimal_xlsx(target: &Path, shared: &[&str], sheet_rows: &str) {
    // Minimal XLSX: sharedStrings.xml plus one worksheet; the reader needs nothing else.
    let sst: String = shared
        .iter()
        .map(|s| format!("<si><t>{s}</t></si>"))
        .collect();
    let shared_xml = format!(
        r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{n}" uniqueCount="{n}">{sst}</sst>"##,
        n = shared.len()
    );
    let sheet_xml = format!(
        r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>{sheet_rows}</sheetData>
</worksheet>"##
    );
    write_zip(
        target,
        &[
            ("xl/sharedStrings.xml", shared_xml.as_str()),
            ("xl/worksheets/sheet1.xml", sheet_xml.as_str()),
        ],
    );
}

const SHARED: &[&str] = &["地域", "感想", "東京", "大阪", "立地 近い 便利", "価格 高い"];

const ROWS: &str = r#"
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2" t="s"><v>4</v></c></row>
<row r="3"><c r="A3" t="s"><v>2</v></c><c r="B3" t="s"><v>4</v></c></row>
<row r="4"><c r="A4" t="s"><v>3</v></c><c r="B4" t="s"><v>5</v></c></row>
"#;

#[test]
fn xlsx_first_row_is_header() {
    let dir = tempdir().expect("create tempdir");
    let path = dir.path().join("survey.xlsx");
    write_minimal_xlsx(&path, SHARED, ROWS);

    let table = read_xlsx(&path).expect("read xlsx");
    assert_eq!(table.headers, vec!["地域", "感想"]);
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows[2], vec!["大阪", "価格 高い"]);
}

#[test]
fn xlsx_inline_and_numeric_cells_without_shared_strings() {
    let dir = tempdir().expect("create tempdir");
    let path = dir.path().join("inline.xlsx");
    let sheet = r##"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>id</t></is></c><c r="C1" t="inlineStr"><is><t>感想</t></is></c></row>
<row r="2"><c r="A2"><v>7</v></c><c r="C2" t="inlineStr"><is><t>部屋 狭い</t></is></c></row>
</sheetData></worksheet>"##;
    write_zip(&path, &[("xl/worksheets/sheet1.xml", sheet)]);

    let table = read_xlsx(&path).expect("read xlsx");
    assert_eq!(table.headers, vec!["id", "column_2", "感想"]);
    assert_eq!(table.rows[0], vec!["7", "", "部屋 狭い"]);
}

#[test]
fn xlsx_feeds_the_pipeline() {
    let dir = tempdir().expect("create tempdir");
    let path = dir.path().join("survey.xlsx");
    write_minimal_xlsx(&path, SHARED, ROWS);

    let opts = AnalysisOptions {
        export_format: ExportFormat::Json,
        text_columns: vec!["感想".to_string()],
        ..AnalysisOptions::default()
    };
    let report = analyze_path(&path, &opts, dir.path()).expect("analyze xlsx");
    assert_eq!(report.overview.records, 3);
    assert_eq!(report.overview.graph.weight("立地", "便利"), Some(2));
    assert_eq!(report.overview.graph.edge_count(), 3);
}

#[test]
fn xlsx_missing_file_returns_error() {
    let dir = tempdir().expect("create tempdir");
    let missing = dir.path().join("nope.xlsx");
    let err = read_xlsx(&missing).unwrap_err();
    assert!(matches!(err, NetworkError::Io { .. }), "Unexpected error: {err}");
}

#[test]
fn xlsx_without_worksheet_returns_error() {
    let dir = tempdir().expect("create tempdir");
    let path = dir.path().join("empty.xlsx");
    write_zip(&path, &[("xl/workbook.xml", "<workbook/>")]);
    let err = read_xlsx(&path).unwrap_err();
    assert!(
        err.to_string().to_lowercase().contains("no worksheets"),
        "Unexpected error: {err}"
    );
}

#[test]
fn xlsx_oversized_cell_reference_returns_error() {
    let dir = tempdir().expect("create tempdir");
    let path = dir.path().join("broken.xlsx");
    let sheet = r##"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="AAAAAAAAAAAAAAA1" t="inlineStr"><is><t>感想</t></is></c></row>
</sheetData></worksheet>"##;
    write_zip(&path, &[("xl/worksheets/sheet1.xml", sheet)]);
    let err = read_xlsx(&path).unwrap_err();
    assert!(matches!(err, NetworkError::Spreadsheet(_)), "Unexpected error: {err}");

    let wide = r##"<worksheet><sheetData>
<row r="1"><c r="ZZZZZZZ1" t="inlineStr"><is><t>感想</t></is></c></row>
</sheetData></worksheet>"##;
    write_zip(&path, &[("xl/worksheets/sheet1.xml", wide)]);
    assert!(read_xlsx(&path).is_err());
}

#[test]
fn xlsx_reads_first_tab_in_workbook_order() {
    let dir = tempdir().expect("create tempdir");
    let path = dir.path().join("tabs.xlsx");
    let workbook = r##"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>
<sheet name="回答" sheetId="2" r:id="rId2"/>
<sheet name="メモ" sheetId="1" r:id="rId1"/>
</sheets></workbook>"##;
    let rels = r##"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
</Relationships>"##;
    let memo = r##"<worksheet><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>メモ</t></is></c></row>
</sheetData></worksheet>"##;
    let answers = r##"<worksheet><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>感想</t></is></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><t>立地 近い</t></is></c></row>
</sheetData></worksheet>"##;
    write_zip(
        &path,
        &[
            ("xl/workbook.xml", workbook),
            ("xl/_rels/workbook.xml.rels", rels),
            ("xl/worksheets/sheet1.xml", memo),
            ("xl/worksheets/sheet2.xml", answers),
        ],
    );

    let table = read_xlsx(&path).expect("read xlsx");
    assert_eq!(table.headers, vec!["感想"]);
    assert_eq!(table.rows, vec![vec!["立地 近い".to_string()]]);
}
