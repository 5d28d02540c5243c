use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{
    is_metric_column, CellValue, Record, Table, COL_DATE, COL_EXPORTER, COL_PRODUCT,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A load that cannot produce a table. Per-cell coercion failures are not
/// errors; they degrade the cell to null.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("malformed input: {0}")]
    Malformed(String),
    #[error("reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("reading spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("reading CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Supported upload formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Xlsx,
    Csv,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" => Ok(FileFormat::Xlsx),
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            other => Err(LoadError::UnsupportedExtension(other.to_string())),
        }
    }
}

/// Load a condensado file. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` – the sheet produced by the transform step (first
///   worksheet is read)
/// * `.csv`  – same columns, comma-separated
/// * `.json` – records-oriented export (`df.to_json(orient="records")`)
pub fn load_file(path: &Path) -> Result<Table, LoadError> {
    let format = FileFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    parse_bytes(format, &bytes)
}

/// Parse raw upload bytes into a [`Table`]. This is the cache-facing entry:
/// parsing the same bytes twice yields equal tables.
pub fn parse_bytes(format: FileFormat, bytes: &[u8]) -> Result<Table, LoadError> {
    let (headers, rows) = match format {
        FileFormat::Xlsx => read_xlsx(bytes)?,
        FileFormat::Csv => read_csv(bytes)?,
        FileFormat::Json => read_json(bytes)?,
    };
    build_table(headers, rows)
}

// ---------------------------------------------------------------------------
// Raw cells – format-independent intermediate
// ---------------------------------------------------------------------------

/// A cell as read from the file, before column-aware coercion.
#[derive(Debug, Clone, PartialEq)]
enum RawCell {
    Text(String),
    Number(f64),
    Int(i64),
    Bool(bool),
    Date(NaiveDate),
    Empty,
}

impl RawCell {
    fn from_str(s: &str) -> Self {
        if s.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(s.to_string())
        }
    }

    fn as_text(&self) -> String {
        match self {
            RawCell::Text(s) => s.trim().to_string(),
            RawCell::Number(v) => v.to_string(),
            RawCell::Int(i) => i.to_string(),
            RawCell::Bool(b) => b.to_string(),
            RawCell::Date(d) => d.to_string(),
            RawCell::Empty => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// XLSX reader
// ---------------------------------------------------------------------------

fn xlsx_cell(cell: &Data) -> RawCell {
    match cell {
        Data::String(s) => RawCell::from_str(s.trim()),
        Data::Float(v) => RawCell::Number(*v),
        Data::Int(i) => RawCell::Int(*i),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => RawCell::Date(ndt.date()),
            None => RawCell::Empty,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::from_str(s.trim()),
        // Error cells (#N/A, #DIV/0!, ...) degrade to null, like NaN.
        Data::Error(_) => RawCell::Empty,
        Data::Empty => RawCell::Empty,
    }
}

fn read_xlsx(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<RawCell>>), LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::Malformed("workbook has no worksheets".to_string()))??;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = rows_iter
        .next()
        .map(|row| row.iter().map(|c| xlsx_cell(c).as_text()).collect())
        .unwrap_or_default();

    let rows = rows_iter
        .map(|row| {
            let mut cells: Vec<RawCell> = row.iter().map(xlsx_cell).collect();
            cells.resize(headers.len(), RawCell::Empty);
            cells
        })
        .collect();

    Ok((headers, rows))
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<RawCell>>), LoadError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(
            (0..headers.len())
                .map(|i| RawCell::from_str(record.get(i).unwrap_or("").trim()))
                .collect(),
        );
    }
    Ok((headers, rows))
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented layout: a top-level array of flat objects, one per row.
/// Column order is the sorted union of keys.
fn read_json(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<RawCell>>), LoadError> {
    let root: JsonValue = serde_json::from_slice(bytes)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Malformed("expected a top-level JSON array".to_string()))?;

    let mut keys: BTreeSet<String> = BTreeSet::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Malformed(format!("row {i} is not a JSON object")))?;
        keys.extend(obj.keys().cloned());
    }
    let headers: Vec<String> = keys.into_iter().collect();

    let rows = records
        .iter()
        .map(|rec| {
            let obj = rec.as_object().expect("checked above");
            headers
                .iter()
                .map(|key| json_cell(obj.get(key)))
                .collect()
        })
        .collect();

    Ok((headers, rows))
}

fn json_cell(val: Option<&JsonValue>) -> RawCell {
    match val {
        Some(JsonValue::String(s)) => RawCell::from_str(s.trim()),
        Some(JsonValue::Number(n)) => {
            if let Some(i) = n.as_i64() {
                RawCell::Int(i)
            } else if let Some(f) = n.as_f64() {
                RawCell::Number(f)
            } else {
                RawCell::Text(n.to_string())
            }
        }
        Some(JsonValue::Bool(b)) => RawCell::Bool(*b),
        Some(JsonValue::Null) | None => RawCell::Empty,
        Some(other) => RawCell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Table construction – coercion and derived fields
// ---------------------------------------------------------------------------

fn build_table(headers: Vec<String>, rows: Vec<Vec<RawCell>>) -> Result<Table, LoadError> {
    let column_index = |name: &'static str| -> Result<usize, LoadError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(LoadError::MissingColumn(name))
    };
    let date_idx = column_index(COL_DATE)?;
    let product_idx = column_index(COL_PRODUCT)?;
    let exporter_idx = column_index(COL_EXPORTER)?;

    let mut coercion_failures = 0usize;
    let mut records = Vec::with_capacity(rows.len());

    for row in &rows {
        let date = raw_to_date(&row[date_idx]);
        let year = date.map(|d| d.year());
        let month = date.map(|d| d.format("%Y-%m").to_string());

        let mut values = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if idx == date_idx || idx == product_idx || idx == exporter_idx {
                continue;
            }
            let cell = row.get(idx).unwrap_or(&RawCell::Empty);
            let value = if is_metric_column(header) {
                coerce_numeric(cell, &mut coercion_failures)
            } else {
                passthrough(cell)
            };
            values.insert(header.clone(), value);
        }

        records.push(Record {
            date,
            product: row[product_idx].as_text(),
            exporter: row[exporter_idx].as_text(),
            year,
            month,
            values,
        });
    }

    if coercion_failures > 0 {
        log::debug!("{coercion_failures} metric cells could not be coerced to numbers");
    }

    Ok(Table::from_records(headers, records))
}

/// Best-effort date coercion; anything unparsable becomes `None`.
fn raw_to_date(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Date(d) => Some(*d),
        RawCell::Text(s) => parse_date(s),
        _ => None,
    }
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Numeric coercion for known metric columns: `Float` or `Null`, never an
/// error. Failures are counted for the load-level log line.
fn coerce_numeric(cell: &RawCell, failures: &mut usize) -> CellValue {
    match cell {
        RawCell::Number(v) => CellValue::Float(*v),
        RawCell::Int(i) => CellValue::Float(*i as f64),
        RawCell::Bool(b) => CellValue::Float(if *b { 1.0 } else { 0.0 }),
        RawCell::Text(s) => match s.trim().parse::<f64>() {
            Ok(v) => CellValue::Float(v),
            Err(_) => {
                *failures += 1;
                CellValue::Null
            }
        },
        RawCell::Date(_) => {
            *failures += 1;
            CellValue::Null
        }
        RawCell::Empty => CellValue::Null,
    }
}

/// Unknown columns pass through with type guessing, so they remain usable
/// for search and the detail table.
fn passthrough(cell: &RawCell) -> CellValue {
    match cell {
        RawCell::Number(v) => CellValue::Float(*v),
        RawCell::Int(i) => CellValue::Integer(*i),
        RawCell::Bool(b) => CellValue::Bool(*b),
        RawCell::Date(d) => CellValue::Text(d.to_string()),
        RawCell::Text(s) => guess_cell_type(s),
        RawCell::Empty => CellValue::Null,
    }
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}
