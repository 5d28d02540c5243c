use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Known columns of a condensado sheet
// ---------------------------------------------------------------------------

/// Required date column.
pub const COL_DATE: &str = "Fecha";
/// Required product column.
pub const COL_PRODUCT: &str = "Producto/Presentación";
/// Required exporter column.
pub const COL_EXPORTER: &str = "Exportador";

/// The ten per-piece cost columns a condensado may carry, in display order.
pub const COST_METRICS: [&str; 10] = [
    "Precio compra EUROS",
    "Costo pieza mxn",
    "Flete Maritimo ($/pieza)",
    "DTA ($/pieza)",
    "IGI ($/pieza)",
    "Aduana y Flete Terrestre ($/pieza)",
    "COSTO DE IMPORTACION X PIEZA ($/pieza)",
    "Gastos Locales Naviera $/pieza",
    "Costo Compra Ana Dis ($/pieza)",
    "Precio Unitario Compra Pasta Mia",
];

/// The three exchange-rate columns.
pub const RATE_METRICS: [&str; 3] = [
    "TIPO DE CAMBIO",
    "DÓLAR (DOF)",
    "FACTORAJE (DOF)",
];

/// Whether `name` is one of the known numeric metric columns.
pub fn is_metric_column(name: &str) -> bool {
    COST_METRICS.contains(&name) || RATE_METRICS.contains(&name)
}

// ---------------------------------------------------------------------------
// CellValue – a single cell in a passthrough or metric column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes that occur in a
/// condensado sheet. Using `BTreeMap` / `BTreeSet` downstream so `CellValue`
/// must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    /// Numeric cells render with four decimals, the dashboard's on-screen
    /// format; nulls render empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Interpret the cell as an `f64` where possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the loaded table
// ---------------------------------------------------------------------------

/// A single import record (one row of the uploaded sheet).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Shipment date; `None` when the cell was unparsable.
    pub date: Option<NaiveDate>,
    pub product: String,
    pub exporter: String,
    /// Derived from `date` at load time.
    pub year: Option<i32>,
    /// Derived `"YYYY-MM"` period, also from `date`.
    pub month: Option<String>,
    /// Every other column: known metric columns coerced to `Float`/`Null`,
    /// the rest passed through as-is.
    pub values: BTreeMap<String, CellValue>,
}

impl Record {
    /// Numeric value of a metric column, `None` for null or absent cells.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(|v| v.as_f64())
    }

    /// On-screen string for `column`, used by search and the CSV export.
    pub fn display_value(&self, column: &str) -> String {
        match column {
            COL_DATE => self.date.map(|d| d.to_string()).unwrap_or_default(),
            COL_PRODUCT => self.product.clone(),
            COL_EXPORTER => self.exporter.clone(),
            _ => self
                .values
                .get(column)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The parsed table with indices computed once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// All records (rows).
    pub records: Vec<Record>,
    /// Column names in original header order. The derived `year` / `month`
    /// fields are not columns and never appear here.
    pub columns: Vec<String>,
    /// Cost-metric columns present in this upload, in catalogue order.
    pub cost_metrics: Vec<String>,
    /// Exchange-rate columns present in this upload, in catalogue order.
    pub rate_metrics: Vec<String>,
    /// Distinct years derived from parsable dates.
    pub years: BTreeSet<i32>,
    /// Distinct non-empty products.
    pub products: BTreeSet<String>,
    /// Distinct non-empty exporters.
    pub exporters: BTreeSet<String>,
}

impl Table {
    /// Build the table and its indices from loaded records.
    pub fn from_records(columns: Vec<String>, records: Vec<Record>) -> Self {
        let cost_metrics = COST_METRICS
            .iter()
            .filter(|m| columns.iter().any(|c| c == *m))
            .map(|m| m.to_string())
            .collect();
        let rate_metrics = RATE_METRICS
            .iter()
            .filter(|m| columns.iter().any(|c| c == *m))
            .map(|m| m.to_string())
            .collect();

        let mut years = BTreeSet::new();
        let mut products = BTreeSet::new();
        let mut exporters = BTreeSet::new();
        for rec in &records {
            if let Some(y) = rec.year {
                years.insert(y);
            }
            if !rec.product.is_empty() {
                products.insert(rec.product.clone());
            }
            if !rec.exporter.is_empty() {
                exporters.insert(rec.exporter.clone());
            }
        }

        Table {
            records,
            columns,
            cost_metrics,
            rate_metrics,
            years,
            products,
            exporters,
        }
    }

    /// Every metric column present in this upload (costs, then rates).
    pub fn available_metrics(&self) -> impl Iterator<Item = &str> {
        self.cost_metrics
            .iter()
            .chain(self.rate_metrics.iter())
            .map(String::as_str)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_cells_render_with_four_decimals() {
        assert_eq!(CellValue::Float(17.25).to_string(), "17.2500");
        assert_eq!(CellValue::Null.to_string(), "");
    }

    #[test]
    fn indices_skip_empty_and_null_keys() {
        let rec = |product: &str, year: Option<i32>| Record {
            date: year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)),
            product: product.to_string(),
            exporter: "Molino SpA".to_string(),
            year,
            month: year.map(|y| format!("{y:04}-01")),
            values: BTreeMap::new(),
        };
        let table = Table::from_records(
            vec![
                COL_DATE.to_string(),
                COL_PRODUCT.to_string(),
                COL_EXPORTER.to_string(),
            ],
            vec![rec("Pasta corta", Some(2023)), rec("", None)],
        );

        assert_eq!(table.len(), 2);
        assert_eq!(table.years.iter().copied().collect::<Vec<_>>(), vec![2023]);
        assert_eq!(table.products.len(), 1);
        assert!(table.products.contains("Pasta corta"));
    }

    #[test]
    fn available_metrics_follow_catalogue_order() {
        let columns = vec![
            COL_DATE.to_string(),
            COL_PRODUCT.to_string(),
            COL_EXPORTER.to_string(),
            "TIPO DE CAMBIO".to_string(),
            "Costo pieza mxn".to_string(),
            "Precio compra EUROS".to_string(),
        ];
        let table = Table::from_records(columns, Vec::new());
        let metrics: Vec<&str> = table.available_metrics().collect();
        assert_eq!(
            metrics,
            vec!["Precio compra EUROS", "Costo pieza mxn", "TIPO DE CAMBIO"]
        );
    }
}
