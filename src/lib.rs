//! Data core of the import-cost analysis dashboard.
//!
//! Loads a condensado spreadsheet into an in-memory [`Table`], narrows it by
//! the user's [`Selection`], and computes the grouped aggregations the
//! charts display. The presentation layer is an external collaborator: it
//! calls [`SessionState`] mutators on every interaction and re-reads the
//! derived view, so everything here is pure and re-invocable.

pub mod data;
pub mod state;

pub use data::filter::Selection;
pub use data::loader::{load_file, FileFormat, LoadError};
pub use data::model::Table;
pub use state::SessionState;
