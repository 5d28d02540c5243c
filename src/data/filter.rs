use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{Record, Table};

// ---------------------------------------------------------------------------
// Selection – the user's current filter choices
// ---------------------------------------------------------------------------

/// The transient filter state fed back by the widgets on every interaction:
/// selected years, products and exporters, plus the optional `(base, other)`
/// year pair for comparison mode.
///
/// An empty `years` set means "no year filter". An empty `products` or
/// `exporters` set means nothing is ticked, so every row is excluded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub years: BTreeSet<i32>,
    pub products: BTreeSet<String>,
    pub exporters: BTreeSet<String>,
    pub compare: Option<(i32, i32)>,
}

impl Selection {
    /// The dashboard's initial widget state: every product and exporter
    /// ticked, no year restriction, comparison off.
    pub fn all(table: &Table) -> Self {
        Selection {
            years: BTreeSet::new(),
            products: table.products.clone(),
            exporters: table.exporters.clone(),
            compare: None,
        }
    }

    fn matches(&self, rec: &Record) -> bool {
        if !self.products.contains(&rec.product) {
            return false;
        }
        if !self.exporters.contains(&rec.exporter) {
            return false;
        }
        if self.years.is_empty() {
            return true;
        }
        // A record without a parsable date has no year and cannot match an
        // explicit year filter.
        match rec.year {
            Some(y) => self.years.contains(&y),
            None => false,
        }
    }
}

/// Narrow `table` to the rows matching `selection`.
///
/// Pure: the input is untouched and the result is a new table with freshly
/// computed indices. An empty result is a valid table, not an error.
pub fn filter(table: &Table, selection: &Selection) -> Table {
    let records: Vec<Record> = table
        .records
        .iter()
        .filter(|rec| selection.matches(rec))
        .cloned()
        .collect();
    Table::from_records(table.columns.clone(), records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{parse_bytes, FileFormat};
    use pretty_assertions::assert_eq;

    const CSV: &str = "\
Fecha,Producto/Presentación,Exportador,Costo pieza mxn
2023-01-15,Pasta corta,Molino SpA,10.0
2023-06-20,Pasta larga,Molino SpA,12.0
2024-02-01,Pasta corta,Italgrani,14.0
sin-fecha,Pasta corta,Molino SpA,16.0
";

    fn table() -> Table {
        parse_bytes(FileFormat::Csv, CSV.as_bytes()).unwrap()
    }

    #[test]
    fn all_selection_passes_every_categorised_row() {
        let table = table();
        let out = filter(&table, &Selection::all(&table));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn rows_must_match_product_and_exporter_and_year() {
        let table = table();
        let mut sel = Selection::all(&table);
        sel.products = ["Pasta corta".to_string()].into();
        sel.years = [2023].into();
        let out = filter(&table, &sel);
        assert_eq!(out.len(), 1);
        assert_eq!(out.records[0].exporter, "Molino SpA");
        assert_eq!(out.records[0].year, Some(2023));
    }

    #[test]
    fn empty_year_set_means_no_year_filter() {
        let table = table();
        let mut sel = Selection::all(&table);
        sel.years.clear();
        // Dateless row included again: only the year axis is unfiltered.
        assert_eq!(filter(&table, &sel).len(), 4);
    }

    #[test]
    fn empty_product_set_excludes_everything() {
        let table = table();
        let mut sel = Selection::all(&table);
        sel.products.clear();
        let out = filter(&table, &sel);
        assert!(out.is_empty());
        assert_eq!(out.columns, table.columns);
    }

    #[test]
    fn year_filter_drops_dateless_rows() {
        let table = table();
        let mut sel = Selection::all(&table);
        sel.years = [2023, 2024].into();
        assert_eq!(filter(&table, &sel).len(), 3);
    }

    #[test]
    fn filter_does_not_mutate_the_input() {
        let table = table();
        let before = table.clone();
        let mut sel = Selection::all(&table);
        sel.exporters = ["Italgrani".to_string()].into();
        let out = filter(&table, &sel);
        assert_eq!(out.len(), 1);
        assert_eq!(table, before);
    }

    #[test]
    fn output_rows_are_an_exact_predicate_subset() {
        let table = table();
        let mut sel = Selection::all(&table);
        sel.exporters = ["Molino SpA".to_string()].into();
        sel.years = [2023].into();
        let out = filter(&table, &sel);
        for rec in &out.records {
            assert_eq!(rec.exporter, "Molino SpA");
            assert_eq!(rec.year, Some(2023));
        }
        let matching_in_input = table
            .records
            .iter()
            .filter(|r| r.exporter == "Molino SpA" && r.year == Some(2023))
            .count();
        assert_eq!(out.len(), matching_in_input);
    }
}
