use pretty_assertions::assert_eq;

use super::agg::*;
use super::loader::{parse_bytes, FileFormat};
use super::model::Table;

fn table(csv: &str) -> Table {
    parse_bytes(FileFormat::Csv, csv.as_bytes()).expect("test csv parses")
}

const TWO_YEARS: &str = "\
Fecha,Producto/Presentación,Exportador,Costo pieza mxn,TIPO DE CAMBIO
2023-01-10,Pasta corta,Molino SpA,10.0,17.0
2023-03-05,Pasta corta,Molino SpA,14.0,18.0
2023-07-20,Pasta larga,Italgrani,20.0,17.5
2024-02-14,Pasta corta,Molino SpA,12.0,19.0
2024-05-30,Pasta larga,Italgrani,26.0,20.0
2024-08-01,Harina,Italgrani,8.0,
";

#[test]
fn group_mean_by_product_orders_lexicographically() {
    let t = table(TWO_YEARS);
    let rows = group_mean(&t, "Costo pieza mxn", Dimension::Product, false);
    let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["Harina", "Pasta corta", "Pasta larga"]);
    assert_eq!(rows[1].mean, Some(12.0)); // (10 + 14 + 12) / 3
    assert_eq!(rows[1].count, 3);
}

#[test]
fn group_mean_by_year_is_chronological() {
    let t = table(TWO_YEARS);
    let rows = group_mean(&t, "Costo pieza mxn", Dimension::Year, false);
    assert_eq!(
        rows,
        vec![
            GroupMean {
                key: "2023".to_string(),
                year: None,
                mean: Some(44.0 / 3.0),
                count: 3,
            },
            GroupMean {
                key: "2024".to_string(),
                year: None,
                mean: Some(46.0 / 3.0),
                count: 3,
            },
        ]
    );
}

#[test]
fn group_mean_split_by_year_yields_one_series_per_year() {
    let t = table(TWO_YEARS);
    let rows = group_mean(&t, "Costo pieza mxn", Dimension::Product, true);
    let pasta_corta: Vec<&GroupMean> =
        rows.iter().filter(|r| r.key == "Pasta corta").collect();
    assert_eq!(pasta_corta.len(), 2);
    assert_eq!(pasta_corta[0].year, Some(2023));
    assert_eq!(pasta_corta[0].mean, Some(12.0));
    assert_eq!(pasta_corta[1].year, Some(2024));
    assert_eq!(pasta_corta[1].mean, Some(12.0));
}

#[test]
fn group_mean_partitions_rows_with_non_null_keys() {
    let csv = "\
Fecha,Producto/Presentación,Exportador,Costo pieza mxn
2023-01-10,A,X,1.0
2023-02-10,A,X,2.0
2024-01-10,B,X,3.0
bad-date,B,X,4.0
";
    let t = table(csv);
    let rows = group_mean(&t, "Costo pieza mxn", Dimension::Year, false);
    // The dateless row is dropped; every other row lands in exactly one group.
    let counted: usize = rows.iter().map(|r| r.count).sum();
    assert_eq!(counted, 3);
}

#[test]
fn group_mean_all_null_group_is_none_not_zero() {
    let csv = "\
Fecha,Producto/Presentación,Exportador,Costo pieza mxn
2023-01-10,A,X,n/a
2023-02-10,A,X,
2024-01-10,A,X,5.0
";
    let t = table(csv);
    let rows = group_mean(&t, "Costo pieza mxn", Dimension::Year, false);
    assert_eq!(rows[0].key, "2023");
    assert_eq!(rows[0].mean, None);
    assert_eq!(rows[0].count, 0);
    assert_eq!(rows[1].mean, Some(5.0));
}

#[test]
fn group_mean_by_month_sorts_periods() {
    let t = table(TWO_YEARS);
    let rows = group_mean(&t, "Costo pieza mxn", Dimension::Month, false);
    let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["2023-01", "2023-03", "2023-07", "2024-02", "2024-05", "2024-08"]
    );
}

#[test]
fn metric_means_by_year_keeps_metric_order() {
    let t = table(TWO_YEARS);
    let metrics = vec![
        "Costo pieza mxn".to_string(),
        "TIPO DE CAMBIO".to_string(),
    ];
    let rows = metric_means_by_year(&t, &metrics);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].year, 2023);
    assert_eq!(rows[0].means[0].0, "Costo pieza mxn");
    assert_eq!(rows[0].means[1], ("TIPO DE CAMBIO".to_string(), Some(17.5)));
    // 2024 has only two rate observations; the blank cell is skipped.
    assert_eq!(rows[1].means[1], ("TIPO DE CAMBIO".to_string(), Some(19.5)));
}

#[test]
fn compare_years_matches_the_worked_example() {
    let csv = "\
Fecha,Producto/Presentación,Exportador,Costo pieza mxn
2023-01-10,A,X,10.0
2024-01-10,A,X,12.0
";
    let t = table(csv);
    let rows = compare_years(&t, 2023, 2024, &["Costo pieza mxn".to_string()]);
    assert_eq!(
        rows,
        vec![YearComparison {
            metric: "Costo pieza mxn".to_string(),
            mean_a: Some(10.0),
            mean_b: Some(12.0),
            delta_pct: Some(20.0),
        }]
    );
}

#[test]
fn compare_year_with_itself_is_zero_delta() {
    let t = table(TWO_YEARS);
    let rows = compare_years(&t, 2023, 2023, &["Costo pieza mxn".to_string()]);
    assert_eq!(rows[0].delta_pct, Some(0.0));
}

#[test]
fn compare_years_zero_base_mean_yields_null_delta() {
    let csv = "\
Fecha,Producto/Presentación,Exportador,Costo pieza mxn
2023-01-10,A,X,0.0
2024-01-10,A,X,12.0
";
    let t = table(csv);
    let rows = compare_years(&t, 2023, 2024, &["Costo pieza mxn".to_string()]);
    assert_eq!(rows[0].mean_a, Some(0.0));
    assert_eq!(rows[0].delta_pct, None);
}

#[test]
fn compare_years_null_means_yield_null_delta() {
    let t = table(TWO_YEARS);
    // No records in 2025 at all.
    let rows = compare_years(&t, 2025, 2024, &["Costo pieza mxn".to_string()]);
    assert_eq!(rows[0].mean_a, None);
    assert_eq!(rows[0].delta_pct, None);
}

#[test]
fn compare_years_rounds_delta_to_two_decimals() {
    let csv = "\
Fecha,Producto/Presentación,Exportador,Costo pieza mxn
2023-01-10,A,X,3.0
2024-01-10,A,X,4.0
";
    let t = table(csv);
    let rows = compare_years(&t, 2023, 2024, &["Costo pieza mxn".to_string()]);
    assert_eq!(rows[0].delta_pct, Some(33.33));
}

#[test]
fn product_breakdown_keeps_only_products_in_both_years() {
    let t = table(TWO_YEARS);
    let rows = product_breakdown(&t, 2023, 2024, "Costo pieza mxn");
    // Harina only exists in 2024 and is silently excluded.
    assert_eq!(
        rows,
        vec![
            ProductBreakdown {
                product: "Pasta corta".to_string(),
                mean_a: Some(12.0),
                mean_b: Some(12.0),
            },
            ProductBreakdown {
                product: "Pasta larga".to_string(),
                mean_a: Some(20.0),
                mean_b: Some(26.0),
            },
        ]
    );
}

#[test]
fn exchange_rate_stats_round_to_four_decimals() {
    let csv = "\
Fecha,Producto/Presentación,Exportador,TIPO DE CAMBIO
2023-01-10,A,X,17.12342
2023-02-10,A,X,18.98764
";
    let t = table(csv);
    let rows = exchange_rate_stats(&t, Dimension::Year, &["TIPO DE CAMBIO".to_string()]);
    assert_eq!(rows.len(), 1);
    let (name, stats) = &rows[0].stats[0];
    assert_eq!(name, "TIPO DE CAMBIO");
    assert_eq!(stats.mean, Some(18.0555));
    assert_eq!(stats.min, Some(17.1234));
    assert_eq!(stats.max, Some(18.9876));
}

#[test]
fn exchange_rate_stats_by_month_groups_periods() {
    let t = table(TWO_YEARS);
    let rows = exchange_rate_stats(&t, Dimension::Month, &["TIPO DE CAMBIO".to_string()]);
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0].key, "2023-01");
    // Single observation: mean == min == max.
    let (_, stats) = &rows[0].stats[0];
    assert_eq!(stats.mean, stats.min);
    assert_eq!(stats.min, Some(17.0));
    assert_eq!(stats.max, Some(17.0));
}

#[test]
fn text_search_empty_query_returns_table_unchanged() {
    let t = table(TWO_YEARS);
    assert_eq!(text_search(&t, ""), t);
}

#[test]
fn text_search_is_case_insensitive() {
    let t = table(TWO_YEARS);
    let hits = text_search(&t, "HARINA");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits.records[0].product, "Harina");
}

#[test]
fn text_search_covers_every_column() {
    let t = table(TWO_YEARS);
    // Matches the on-screen rendering of a metric cell.
    assert_eq!(text_search(&t, "19.0000").len(), 1);
    // Matches the date column.
    assert_eq!(text_search(&t, "2024-05").len(), 1);
    // No match at all is an empty table, not an error.
    assert!(text_search(&t, "no-such-text").is_empty());
}

#[test]
fn summary_counts_and_means() {
    let csv = "\
Fecha,Producto/Presentación,Exportador,Precio compra EUROS
2023-01-10,A,X,10.0
2023-02-10,B,X,20.0
2023-03-10,B,X,
";
    let t = table(csv);
    let s = summary(&t);
    assert_eq!(s.records, 3);
    assert_eq!(s.products, 2);
    assert_eq!(s.mean_purchase_eur, Some(15.0));
    // Column absent from this upload.
    assert_eq!(s.mean_import_cost, None);
}
