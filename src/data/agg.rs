use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::model::{Record, Table};

// ---------------------------------------------------------------------------
// Grouping dimensions
// ---------------------------------------------------------------------------

/// A grouping key for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    Product,
    Year,
    Month,
}

/// Dimension value of a record, `None` when the key is null (those rows are
/// dropped from grouped output). Years render as `"YYYY"` and months as
/// `"YYYY-MM"`, so the natural string order is chronological.
fn dimension_key(rec: &Record, dimension: Dimension) -> Option<String> {
    match dimension {
        Dimension::Product => {
            if rec.product.is_empty() {
                None
            } else {
                Some(rec.product.clone())
            }
        }
        Dimension::Year => rec.year.map(|y| y.to_string()),
        Dimension::Month => rec.month.clone(),
    }
}

// ---------------------------------------------------------------------------
// Shared numeric helpers
// ---------------------------------------------------------------------------

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Mean of `metric` over the records of a single year.
fn year_metric_mean(table: &Table, year: i32, metric: &str) -> Option<f64> {
    let values: Vec<f64> = table
        .records
        .iter()
        .filter(|r| r.year == Some(year))
        .filter_map(|r| r.metric(metric))
        .collect();
    mean(&values)
}

// ---------------------------------------------------------------------------
// Grouped means
// ---------------------------------------------------------------------------

/// One output row of [`group_mean`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    /// Dimension value: product name, `"YYYY"` year or `"YYYY-MM"` month.
    pub key: String,
    /// Secondary year key when cross-grouped for multi-series charts.
    pub year: Option<i32>,
    /// Mean of the metric, `None` when every value in the group is null.
    pub mean: Option<f64>,
    /// Number of non-null observations behind the mean.
    pub count: usize,
}

/// Mean of `metric` per `dimension` group, skipping nulls.
///
/// With `by_year` set and a `Product` or `Month` dimension, groups are
/// additionally split by year (one chart series per year); rows without a
/// year are dropped in that mode. Output is ordered by key, then year.
pub fn group_mean(
    table: &Table,
    metric: &str,
    dimension: Dimension,
    by_year: bool,
) -> Vec<GroupMean> {
    let split_years = by_year && dimension != Dimension::Year;
    let mut groups: BTreeMap<(String, Option<i32>), Vec<f64>> = BTreeMap::new();

    for rec in &table.records {
        let Some(key) = dimension_key(rec, dimension) else {
            continue;
        };
        let year = if split_years {
            match rec.year {
                Some(y) => Some(y),
                None => continue,
            }
        } else {
            None
        };
        let group = groups.entry((key, year)).or_default();
        if let Some(v) = rec.metric(metric) {
            group.push(v);
        }
    }

    groups
        .into_iter()
        .map(|((key, year), values)| GroupMean {
            key,
            year,
            mean: mean(&values),
            count: values.len(),
        })
        .collect()
}

/// Per-year mean of several metrics at once (the "all costs by year"
/// overview). One row per year; `means` follows the order of `metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMeans {
    pub year: i32,
    pub means: Vec<(String, Option<f64>)>,
}

pub fn metric_means_by_year(table: &Table, metrics: &[String]) -> Vec<YearMeans> {
    let mut by_year: BTreeMap<i32, BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
    for rec in &table.records {
        let Some(year) = rec.year else { continue };
        let per_metric = by_year.entry(year).or_default();
        for metric in metrics {
            if let Some(v) = rec.metric(metric) {
                per_metric.entry(metric).or_default().push(v);
            }
        }
    }

    by_year
        .into_iter()
        .map(|(year, per_metric)| YearMeans {
            year,
            means: metrics
                .iter()
                .map(|m| {
                    let values = per_metric.get(m.as_str());
                    (m.clone(), values.and_then(|v| mean(v)))
                })
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Year-over-year comparison
// ---------------------------------------------------------------------------

/// Per-metric comparison row between two years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearComparison {
    pub metric: String,
    pub mean_a: Option<f64>,
    pub mean_b: Option<f64>,
    /// `(mean_b - mean_a) / mean_a * 100`, rounded to 2 decimals. `None`
    /// when the base mean is null or zero, or the other mean is null.
    pub delta_pct: Option<f64>,
}

/// Compare the per-metric means of `year_a` (base) and `year_b`.
pub fn compare_years(
    table: &Table,
    year_a: i32,
    year_b: i32,
    metrics: &[String],
) -> Vec<YearComparison> {
    metrics
        .iter()
        .map(|metric| {
            let mean_a = year_metric_mean(table, year_a, metric);
            let mean_b = year_metric_mean(table, year_b, metric);
            let delta_pct = match (mean_a, mean_b) {
                (Some(a), Some(b)) if a != 0.0 => Some(round_to((b - a) / a * 100.0, 2)),
                _ => None,
            };
            YearComparison {
                metric: metric.clone(),
                mean_a,
                mean_b,
                delta_pct,
            }
        })
        .collect()
}

/// Per-product means of one metric for two years, restricted to products
/// that have records in both years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductBreakdown {
    pub product: String,
    pub mean_a: Option<f64>,
    pub mean_b: Option<f64>,
}

pub fn product_breakdown(
    table: &Table,
    year_a: i32,
    year_b: i32,
    metric: &str,
) -> Vec<ProductBreakdown> {
    let mut values_a: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut values_b: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut present_a: BTreeSet<String> = BTreeSet::new();
    let mut present_b: BTreeSet<String> = BTreeSet::new();

    for rec in &table.records {
        if rec.product.is_empty() {
            continue;
        }
        let (present, values) = match rec.year {
            Some(y) if y == year_a => (&mut present_a, &mut values_a),
            Some(y) if y == year_b => (&mut present_b, &mut values_b),
            _ => continue,
        };
        present.insert(rec.product.clone());
        if let Some(v) = rec.metric(metric) {
            values.entry(rec.product.clone()).or_default().push(v);
        }
    }

    present_a
        .intersection(&present_b)
        .map(|product| ProductBreakdown {
            product: product.clone(),
            mean_a: values_a.get(product).and_then(|v| mean(v)),
            mean_b: values_b.get(product).and_then(|v| mean(v)),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Exchange-rate statistics
// ---------------------------------------------------------------------------

/// Mean / min / max of one exchange-rate metric within a group, rounded to
/// 4 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricStats {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Exchange-rate statistics per group; `stats` follows the order of
/// `metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateStats {
    pub key: String,
    pub stats: Vec<(String, MetricStats)>,
}

pub fn exchange_rate_stats(
    table: &Table,
    dimension: Dimension,
    metrics: &[String],
) -> Vec<RateStats> {
    let mut groups: BTreeMap<String, BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
    for rec in &table.records {
        let Some(key) = dimension_key(rec, dimension) else {
            continue;
        };
        let per_metric = groups.entry(key).or_default();
        for metric in metrics {
            if let Some(v) = rec.metric(metric) {
                per_metric.entry(metric).or_default().push(v);
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, per_metric)| RateStats {
            key,
            stats: metrics
                .iter()
                .map(|m| {
                    let values = per_metric.get(m.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                    let stats = MetricStats {
                        mean: mean(values).map(|v| round_to(v, 4)),
                        min: values.iter().copied().reduce(f64::min).map(|v| round_to(v, 4)),
                        max: values.iter().copied().reduce(f64::max).map(|v| round_to(v, 4)),
                    };
                    (m.clone(), stats)
                })
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Free-text search and the summary cards
// ---------------------------------------------------------------------------

/// Keep the rows where any column's display string contains `query`,
/// case-insensitively. An empty query returns the table unchanged.
pub fn text_search(table: &Table, query: &str) -> Table {
    if query.is_empty() {
        return table.clone();
    }
    let needle = query.to_lowercase();
    let records: Vec<Record> = table
        .records
        .iter()
        .filter(|rec| {
            table
                .columns
                .iter()
                .any(|col| rec.display_value(col).to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();
    Table::from_records(table.columns.clone(), records)
}

/// Headline figures for the summary cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub records: usize,
    pub products: usize,
    /// Mean `Precio compra EUROS`, `None` when absent or all-null.
    pub mean_purchase_eur: Option<f64>,
    /// Mean `COSTO DE IMPORTACION X PIEZA ($/pieza)`, same convention.
    pub mean_import_cost: Option<f64>,
}

pub fn summary(table: &Table) -> Summary {
    let whole_table_mean = |metric: &str| {
        let values: Vec<f64> = table.records.iter().filter_map(|r| r.metric(metric)).collect();
        mean(&values)
    };
    Summary {
        records: table.len(),
        products: table.products.len(),
        mean_purchase_eur: whole_table_mean("Precio compra EUROS"),
        mean_import_cost: whole_table_mean("COSTO DE IMPORTACION X PIEZA ($/pieza)"),
    }
}
