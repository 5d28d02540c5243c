use std::sync::Arc;

use crate::data::cache::TableCache;
use crate::data::export;
use crate::data::filter::{filter, Selection};
use crate::data::loader::{FileFormat, LoadError};
use crate::data::model::Table;
use crate::data::agg::text_search;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// The full dashboard session, independent of rendering: the upload cache,
/// the loaded table, the current selection and search query, and the
/// filtered view the charts read. Every interaction mutates this and
/// re-reads `view` — one synchronous recomputation pass per interaction.
pub struct SessionState {
    cache: TableCache,

    /// Loaded table (None until an upload succeeds).
    pub table: Option<Arc<Table>>,

    /// Current filter choices; reset to "everything" on a new upload.
    pub selection: Selection,

    /// Free-text query applied on top of the selection.
    pub search: String,

    /// Rows passing the current selection and search (recomputed by
    /// [`SessionState::refilter`]).
    pub view: Option<Table>,

    /// Load-failure message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            cache: TableCache::new(),
            table: None,
            selection: Selection::default(),
            search: String::new(),
            view: None,
            status_message: None,
        }
    }
}

impl SessionState {
    /// Ingest an upload. The parsed table is memoised by content, the
    /// selection resets to the initial "everything" state and the view is
    /// recomputed. On failure the previous table stays usable and the error
    /// is kept as the status message.
    pub fn load_upload(&mut self, format: FileFormat, bytes: &[u8]) -> Result<(), LoadError> {
        match self.cache.get_or_parse(format, bytes) {
            Ok(table) => {
                log::info!(
                    "loaded {} records, {} columns, years {:?}",
                    table.len(),
                    table.columns.len(),
                    table.years
                );
                self.selection = Selection::all(&table);
                self.search.clear();
                self.table = Some(table);
                self.status_message = None;
                self.refilter();
                Ok(())
            }
            Err(e) => {
                log::error!("failed to load upload: {e}");
                self.status_message = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Recompute `view` from the current selection and search query.
    pub fn refilter(&mut self) {
        self.view = self.table.as_deref().map(|table| {
            let narrowed = filter(table, &self.selection);
            if self.search.is_empty() {
                narrowed
            } else {
                text_search(&narrowed, &self.search)
            }
        });
    }

    /// Whether a loaded table produced an empty view — the "no data with
    /// these filters" state, distinct from having no upload at all.
    pub fn has_no_matches(&self) -> bool {
        matches!((&self.table, &self.view), (Some(_), Some(view)) if view.is_empty())
    }

    /// Toggle a single year in the year filter.
    pub fn toggle_year(&mut self, year: i32) {
        if !self.selection.years.remove(&year) {
            self.selection.years.insert(year);
        }
        self.refilter();
    }

    /// Toggle a product tick.
    pub fn toggle_product(&mut self, product: &str) {
        if !self.selection.products.remove(product) {
            self.selection.products.insert(product.to_string());
        }
        self.refilter();
    }

    /// Toggle an exporter tick.
    pub fn toggle_exporter(&mut self, exporter: &str) {
        if !self.selection.exporters.remove(exporter) {
            self.selection.exporters.insert(exporter.to_string());
        }
        self.refilter();
    }

    /// Tick every product.
    pub fn select_all_products(&mut self) {
        if let Some(table) = &self.table {
            self.selection.products = table.products.clone();
        }
        self.refilter();
    }

    /// Untick every product.
    pub fn select_no_products(&mut self) {
        self.selection.products.clear();
        self.refilter();
    }

    /// Tick every exporter.
    pub fn select_all_exporters(&mut self) {
        if let Some(table) = &self.table {
            self.selection.exporters = table.exporters.clone();
        }
        self.refilter();
    }

    /// Untick every exporter.
    pub fn select_no_exporters(&mut self) {
        self.selection.exporters.clear();
        self.refilter();
    }

    /// Set or clear the comparison-mode year pair.
    pub fn set_compare(&mut self, pair: Option<(i32, i32)>) {
        self.selection.compare = pair;
    }

    /// Set the free-text search query.
    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
        self.refilter();
    }

    /// CSV export of the current view; `None` when nothing is loaded.
    pub fn export_csv(&self) -> Option<Result<Vec<u8>, csv::Error>> {
        self.view.as_ref().map(export::to_csv)
    }
}
