//! The relationship option search state machine.
//!
//! One resolver per relationship field instance. It pages through the
//! related table's rows, turns each into a labeled choice, and guarantees
//! the two ordering rules that matter under slow networks:
//!
//! - a new query invalidates everything in flight for the old one; a late
//!   response is discarded on arrival, never merged (compare-on-apply via a
//!   generation token);
//! - search and load-more never run concurrently for one instance (a
//!   loading gate refuses the second fetch).
//!
//! Transport failures degrade to an empty result set with no next page; the
//! surrounding form keeps working.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tablekit_forms::RelationChoice;
use tablekit_protocol::{Page, QueryState, Row, RowId, PARAM_PAGE, PARAM_PER_PAGE};
use tablekit_schema::{CollectionRef, RelationTarget};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::services::RowService;

/// Key carrying the related table's sort direction to the row service.
pub const PARAM_ORDER: &str = "order";
/// Key carrying the label field the sort applies to.
pub const PARAM_ORDER_BY: &str = "orderBy";

/// Identifies one in-flight fetch. Applying a ticket whose generation no
/// longer matches the resolver's is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    query: String,
    page: u32,
}

impl SearchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.page
    }
}

/// Search state for one relationship field.
pub struct RelationResolver {
    rows: Arc<dyn RowService>,
    target: RelationTarget,
    per_page: u32,
    generation: u64,
    query: String,
    loading: bool,
    items: Vec<RelationChoice>,
    next_page: Option<u32>,
}

impl RelationResolver {
    pub fn new(rows: Arc<dyn RowService>, target: RelationTarget, config: &EngineConfig) -> Self {
        Self {
            rows,
            target,
            per_page: config.search_per_page,
            generation: 0,
            query: String::new(),
            loading: false,
            items: Vec::new(),
            next_page: None,
        }
    }

    pub fn items(&self) -> &[RelationChoice] {
        &self.items
    }

    pub fn next_page(&self) -> Option<u32> {
        self.next_page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current_query(&self) -> &str {
        &self.query
    }

    /// Start a fresh search. Bumps the generation, so any fetch still in
    /// flight for the previous query dies on arrival.
    pub fn begin_search(&mut self, query: &str) -> SearchTicket {
        self.generation += 1;
        self.query = query.to_string();
        self.loading = true;
        debug!(
            collection = %self.target.collection.slug,
            query,
            generation = self.generation,
            "relationship search started"
        );
        SearchTicket {
            generation: self.generation,
            query: self.query.clone(),
            page: 1,
        }
    }

    /// Ask for the next page of the current query. Refused while a fetch is
    /// in flight or when there is nothing further.
    pub fn begin_load_more(&mut self) -> Option<SearchTicket> {
        if self.loading {
            return None;
        }
        let page = self.next_page?;
        self.loading = true;
        Some(SearchTicket {
            generation: self.generation,
            query: self.query.clone(),
            page,
        })
    }

    /// Apply a fetched page. Returns false when the ticket is stale and the
    /// response was discarded.
    pub fn apply(&mut self, ticket: &SearchTicket, page: Page<Row>) -> bool {
        if ticket.generation != self.generation {
            warn!(
                collection = %self.target.collection.slug,
                stale_query = %ticket.query,
                current_query = %self.query,
                "discarding stale relationship search response"
            );
            return false;
        }
        self.loading = false;
        let choices: Vec<RelationChoice> = page.items.iter().map(|row| self.choice(row)).collect();
        if ticket.page == 1 {
            self.items = choices;
        } else {
            self.items.extend(choices);
        }
        self.next_page = page.next_page;
        true
    }

    /// Record a failed fetch. A failed first page degrades to an empty
    /// result set; a failed later page keeps what is already loaded. Either
    /// way pagination stops.
    pub fn fail(&mut self, ticket: &SearchTicket) {
        if ticket.generation != self.generation {
            return;
        }
        self.loading = false;
        if ticket.page == 1 {
            self.items.clear();
        }
        self.next_page = None;
    }

    /// Fetch and apply one ticket. Transport errors degrade via [`fail`].
    ///
    /// [`fail`]: RelationResolver::fail
    pub async fn run(&mut self, ticket: SearchTicket) -> bool {
        let query = self.request_query(&ticket);
        let slug = self.target.collection.slug.clone();
        match self.rows.list_rows(&slug, &query).await {
            Ok(page) => self.apply(&ticket, page),
            Err(err) => {
                warn!(collection = %slug, %err, "relationship search failed, degrading to empty");
                self.fail(&ticket);
                false
            }
        }
    }

    /// Point this resolver at a different collection. Dependent label-field
    /// and sort-order choices are cleared along with all loaded state.
    pub fn retarget(&mut self, collection: CollectionRef) {
        self.target = self.target.retarget(collection);
        self.generation += 1;
        self.query.clear();
        self.loading = false;
        self.items.clear();
        self.next_page = None;
    }

    pub fn target(&self) -> &RelationTarget {
        &self.target
    }

    /// Recover true labels for preselected ids carrying placeholders. Loaded
    /// pages are checked first, then a direct row lookup; when both fail the
    /// placeholder stays and the id is preserved.
    pub async fn reconcile(&self, selection: &mut [RelationChoice]) {
        for choice in selection.iter_mut().filter(|c| !c.resolved) {
            if let Some(found) = self.items.iter().find(|i| i.resolved && i.id == choice.id) {
                *choice = found.clone();
                continue;
            }
            let Ok(id) = choice.id.parse::<RowId>() else {
                continue;
            };
            match self.rows.get_row(&self.target.collection.slug, &id).await {
                Ok(row) => *choice = self.choice(&row),
                Err(err) => {
                    debug!(id = %choice.id, %err, "label lookup failed, keeping placeholder");
                }
            }
        }
    }

    fn choice(&self, row: &Row) -> RelationChoice {
        let label = self
            .target
            .field
            .as_ref()
            .and_then(|f| row.value(&f.slug).as_text())
            .map(str::to_string)
            .unwrap_or_else(|| row.id.to_string());
        RelationChoice::resolved(row.id.to_string(), label)
    }

    fn request_query(&self, ticket: &SearchTicket) -> QueryState {
        let mut query = QueryState::new();
        query.set(PARAM_PAGE, ticket.page.to_string());
        query.set(PARAM_PER_PAGE, self.per_page.to_string());
        if let Some(field) = &self.target.field {
            if !ticket.query.is_empty() {
                query.set(field.slug.clone(), ticket.query.clone());
            }
            if let Some(order) = self.target.order {
                query.set(PARAM_ORDER_BY, field.slug.clone());
                query.set(PARAM_ORDER, order.as_str());
            }
        }
        query
    }
}

/// Coalesces keystrokes: each schedule supersedes the last, and only the
/// newest token survives its settling window.
pub struct Debouncer {
    window: Duration,
    current: AtomicU64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            current: AtomicU64::new(0),
        }
    }

    /// Claim the keystroke. The returned token invalidates every earlier one.
    pub fn schedule(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Wait out the settling window. True only when no later keystroke
    /// arrived meanwhile, meaning the caller should fire the search.
    pub async fn settle(&self, token: u64) -> bool {
        tokio::time::sleep(self.window).await;
        token == self.current.load(Ordering::SeqCst)
    }
}
