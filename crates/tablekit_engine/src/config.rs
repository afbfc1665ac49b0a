//! Engine tuning knobs.

use std::time::Duration;

/// Default rows per list page.
pub const DEFAULT_PER_PAGE: u32 = 25;

/// Default page size for relationship option search.
pub const DEFAULT_SEARCH_PER_PAGE: u32 = 20;

/// How long keystrokes coalesce before a search request fires.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Cached query variants kept per table before eviction.
pub const DEFAULT_VIEWS_PER_TABLE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub per_page: u32,
    pub search_per_page: u32,
    pub search_debounce: Duration,
    pub views_per_table: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            search_per_page: DEFAULT_SEARCH_PER_PAGE,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            views_per_table: DEFAULT_VIEWS_PER_TABLE,
        }
    }
}

impl EngineConfig {
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.search_debounce = window;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }
}
