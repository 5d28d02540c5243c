use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::sync::Arc;

use super::loader::{parse_bytes, FileFormat, LoadError};
use super::model::Table;

/// Memo of the most recently parsed upload, keyed by content hash.
///
/// A session works on one file at a time, so a single slot with
/// replace-on-miss semantics is enough; there is no eviction policy. A
/// failed parse leaves the previous entry in place.
#[derive(Debug, Default)]
pub struct TableCache {
    entry: Option<(u64, Arc<Table>)>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed table for `bytes`, re-parsing only when the content hash
    /// differs from the cached upload.
    pub fn get_or_parse(
        &mut self,
        format: FileFormat,
        bytes: &[u8],
    ) -> Result<Arc<Table>, LoadError> {
        let key = content_hash(bytes);
        if let Some((cached_key, table)) = &self.entry {
            if *cached_key == key {
                log::debug!("upload cache hit ({key:#018x})");
                return Ok(Arc::clone(table));
            }
        }
        let table = Arc::new(parse_bytes(format, bytes)?);
        self.entry = Some((key, Arc::clone(&table)));
        Ok(table)
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

fn content_hash(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    hasher.write(bytes);
    hasher.finish()
}
