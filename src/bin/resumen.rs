//! Console smoke tool: load a condensado file and print the summary the
//! dashboard would chart.
//!
//! Usage:
//!     resumen <file> [year_a year_b]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use condensado::data::agg::{compare_years, exchange_rate_stats, summary, Dimension};
use condensado::data::filter::{filter, Selection};
use condensado::load_file;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        bail!("usage: resumen <file> [year_a year_b]");
    };
    let years: Vec<i32> = args
        .map(|a| a.parse::<i32>().context("years must be integers"))
        .collect::<Result<_>>()?;

    let table = load_file(&path).with_context(|| format!("loading {}", path.display()))?;
    let view = filter(&table, &Selection::all(&table));

    let s = summary(&view);
    println!("Registros: {}", s.records);
    println!("Productos únicos: {}", s.products);
    if let Some(m) = s.mean_purchase_eur {
        println!("Precio compra EUR (prom): €{m:.4}");
    }
    if let Some(m) = s.mean_import_cost {
        println!("Costo importación (prom): ${m:.4}");
    }

    let (year_a, year_b) = match years.as_slice() {
        [a, b] => (*a, *b),
        [] => {
            let mut last = view.years.iter().rev().take(2);
            match (last.next(), last.next()) {
                (Some(&b), Some(&a)) => (a, b),
                _ => {
                    println!("(single year of data, no comparison)");
                    return Ok(());
                }
            }
        }
        _ => bail!("pass either no years or exactly two"),
    };

    println!("\nComparación {year_a} → {year_b}");
    let metrics: Vec<String> = view.cost_metrics.clone();
    for row in compare_years(&view, year_a, year_b, &metrics) {
        let fmt = |v: Option<f64>| match v {
            Some(v) => format!("{v:>12.4}"),
            None => format!("{:>12}", "—"),
        };
        let delta = match row.delta_pct {
            Some(d) => format!("{d:+.2}%"),
            None => "—".to_string(),
        };
        println!(
            "{:<45} {} {} {delta:>9}",
            row.metric,
            fmt(row.mean_a),
            fmt(row.mean_b),
        );
    }

    if !view.rate_metrics.is_empty() {
        println!("\nTipo de cambio por año");
        let rates = view.rate_metrics.clone();
        for group in exchange_rate_stats(&view, Dimension::Year, &rates) {
            for (metric, stats) in &group.stats {
                if let (Some(mean), Some(min), Some(max)) = (stats.mean, stats.min, stats.max) {
                    println!(
                        "{} {metric}: prom {mean:.4}, min {min:.4}, max {max:.4}",
                        group.key
                    );
                }
            }
        }
    }

    Ok(())
}
