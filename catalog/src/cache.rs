use crate::metrics_defs::CACHED_PROJECTS;
use crate::types::{Fetched, ProjectTable, Source};
use parking_lot::RwLock;
use shared::gauge;
use std::sync::Arc;

struct CachedTable {
    table: Arc<ProjectTable>,
    // None until the first load, and again after a clear.
    source: Option<Source>,
}

/// Process-wide store of assembled project records, together with the source
/// they were built from.
///
/// The table is only ever replaced or cleared as a whole. Table and source are
/// swapped under one lock, so readers observe either the previous state or the
/// new one.
pub struct ProjectCache {
    state: RwLock<CachedTable>,
}

impl ProjectCache {
    pub fn new() -> Self {
        ProjectCache {
            state: RwLock::new(CachedTable {
                table: Arc::new(ProjectTable::new()),
                source: None,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().table.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.read().table.len()
    }

    /// Whether a load has completed since creation or the last `clear`. A load
    /// may legitimately produce an empty table.
    pub fn is_loaded(&self) -> bool {
        self.state.read().source.is_some()
    }

    pub fn source(&self) -> Option<Source> {
        self.state.read().source
    }

    pub fn clear(&self) {
        *self.state.write() = CachedTable {
            table: Arc::new(ProjectTable::new()),
            source: None,
        };
        gauge!(CACHED_PROJECTS).set(0.0);
    }

    pub fn replace_all(&self, table: ProjectTable, source: Source) {
        let size = table.len();
        *self.state.write() = CachedTable {
            table: Arc::new(table),
            source: Some(source),
        };
        gauge!(CACHED_PROJECTS).set(size as f64);
    }

    /// Current table. Later replacements do not affect the returned snapshot.
    pub fn snapshot(&self) -> Arc<ProjectTable> {
        self.state.read().table.clone()
    }

    /// Current table tagged with its source, or `None` if nothing is loaded.
    pub fn loaded(&self) -> Option<Fetched<Arc<ProjectTable>>> {
        let state = self.state.read();
        state.source.map(|source| Fetched {
            source,
            data: state.table.clone(),
        })
    }
}

impl Default for ProjectCache {
    fn default() -> Self {
        Self::new()
    }
}
