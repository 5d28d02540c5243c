/// Data layer: core types, loading, filtering, aggregation and export.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse upload → Table (memoised by content hash)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply the Selection → narrowed Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   agg     │  grouped means, year deltas, rate stats, search
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  CSV of the current view
///   └──────────┘
/// ```
pub mod agg;
pub mod cache;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;

#[cfg(test)]
mod agg_tests;
