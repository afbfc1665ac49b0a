//! The shared view cache.
//!
//! Every open list and form for a table reads through one cache keyed by
//! table slug plus the canonical query-string encoding. Mutations patch the
//! affected entries by row id instead of dropping them, so scroll position
//! and filter state survive an edit. All apply operations are idempotent:
//! replaying one leaves the cache unchanged.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tablekit_protocol::{Page, QueryState, Row, RowId};
use tracing::debug;

use crate::config::DEFAULT_VIEWS_PER_TABLE;

#[derive(Debug, Default)]
struct TableViews {
    /// Cached list pages keyed by canonical query encoding.
    pages: BTreeMap<String, Page<Row>>,
    /// Single-row cache.
    rows: BTreeMap<RowId, Row>,
}

/// Cache of list pages and single rows across every table a session has
/// touched. Cheap to share: interior mutability, short critical sections.
#[derive(Debug)]
pub struct ViewCache {
    tables: Mutex<BTreeMap<String, TableViews>>,
    views_per_table: usize,
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWS_PER_TABLE)
    }
}

impl ViewCache {
    pub fn new(views_per_table: usize) -> Self {
        Self {
            tables: Mutex::new(BTreeMap::new()),
            views_per_table: views_per_table.max(1),
        }
    }

    pub fn get(&self, table: &str, query: &QueryState) -> Option<Page<Row>> {
        let tables = self.lock();
        tables.get(table)?.pages.get(&query.encode()).cloned()
    }

    pub fn put(&self, table: &str, query: &QueryState, page: Page<Row>) {
        let mut tables = self.lock();
        let views = tables.entry(table.to_string()).or_default();
        let key = query.encode();
        if views.pages.len() >= self.views_per_table && !views.pages.contains_key(&key) {
            // BTreeMap has no access order; evicting the first key is enough
            // to bound the map.
            if let Some(oldest) = views.pages.keys().next().cloned() {
                views.pages.remove(&oldest);
            }
        }
        for row in &page.items {
            views.rows.insert(row.id.clone(), row.clone());
        }
        views.pages.insert(key, page);
    }

    pub fn get_row(&self, table: &str, id: &RowId) -> Option<Row> {
        let tables = self.lock();
        tables.get(table)?.rows.get(id).cloned()
    }

    pub fn put_row(&self, table: &str, row: Row) {
        let mut tables = self.lock();
        tables
            .entry(table.to_string())
            .or_default()
            .rows
            .insert(row.id.clone(), row);
    }

    /// Merge a freshly created row: it joins the row cache, prepends to
    /// unfiltered first pages, and bumps the totals of the views it belongs
    /// to. Filtered views keep their totals untouched since membership
    /// cannot be judged without re-running the filter server-side.
    pub fn apply_created(&self, table: &str, row: &Row) {
        let mut tables = self.lock();
        let views = tables.entry(table.to_string()).or_default();
        if views.rows.insert(row.id.clone(), row.clone()).is_some() {
            return;
        }
        for (key, page) in &mut views.pages {
            let query = QueryState::decode(key);
            let unfiltered = query.filter_params().next().is_none();
            if !unfiltered || query.trashed() != row.trashed {
                continue;
            }
            page.total += 1;
            if page.page == 1 {
                page.items.insert(0, row.clone());
            }
        }
        debug!(table, row = %row.id, "cache: created row merged");
    }

    /// Replace a row wherever it is cached.
    pub fn apply_updated(&self, table: &str, row: &Row) {
        let mut tables = self.lock();
        let views = tables.entry(table.to_string()).or_default();
        views.rows.insert(row.id.clone(), row.clone());
        for page in views.pages.values_mut() {
            for item in &mut page.items {
                if item.id == row.id {
                    *item = row.clone();
                }
            }
        }
        debug!(table, row = %row.id, "cache: updated row patched");
    }

    /// Drop a row from every view it appears in, adjusting totals.
    pub fn apply_removed(&self, table: &str, id: &RowId) {
        let mut tables = self.lock();
        let Some(views) = tables.get_mut(table) else {
            return;
        };
        if views.rows.remove(id).is_none() {
            return;
        }
        for page in views.pages.values_mut() {
            page.items.retain(|item| &item.id != id);
            page.total = page.total.saturating_sub(1);
        }
        debug!(table, row = %id, "cache: removed row dropped");
    }

    /// A trashed or restored row changes which views may show it: it stays in
    /// the row cache with its new flag and leaves every list whose trash
    /// toggle no longer matches.
    pub fn apply_trash_state(&self, table: &str, row: &Row) {
        let mut tables = self.lock();
        let Some(views) = tables.get_mut(table) else {
            return;
        };
        views.rows.insert(row.id.clone(), row.clone());
        for (key, page) in &mut views.pages {
            let shows_trashed = QueryState::decode(key).trashed();
            if shows_trashed != row.trashed {
                let before = page.items.len();
                page.items.retain(|item| item.id != row.id);
                if page.items.len() != before {
                    page.total = page.total.saturating_sub(1);
                }
            }
        }
        debug!(table, row = %row.id, trashed = row.trashed, "cache: trash state applied");
    }

    /// Forget everything cached for one table. Used when its schema changes,
    /// since stored pages may render through a stale field set.
    pub fn invalidate_table(&self, table: &str) {
        let mut tables = self.lock();
        tables.remove(table);
        debug!(table, "cache: table invalidated");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, TableViews>> {
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
