//! Debounced, paginated book search.
//!
//! Keystrokes reschedule a single pending task; only the last one inside the
//! quiet period reaches the backend. Every new search bumps a generation
//! counter and responses from older generations are dropped, so a slow reply
//! to an abandoned query never overwrites newer results.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::api_client::BookApi;
use crate::domain::dedup::{filter_new, unique_page};
use crate::domain::models::{PAGE_SIZE, SearchState, SearchType};

pub const DEBOUNCE: Duration = Duration::from_millis(500);
pub const MIN_QUERY_LEN: usize = 3;

struct Inner {
    api: Arc<dyn BookApi>,
    generation: AtomicU64,
    state: Mutex<SearchState>,
    /// Serializes `load_more`; never held while the state lock is.
    loading: tokio::sync::Mutex<()>,
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run_search(&self, generation: u64, query: String, search_type: SearchType) {
        let page = match self
            .api
            .search_books(&query, PAGE_SIZE, 0, search_type)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(error = %e, %query, %search_type, "search failed");
                return;
            }
        };

        let mut state = self.state.lock();
        if !self.is_current(generation) {
            tracing::debug!(%query, "discarding superseded search results");
            return;
        }
        state.results = unique_page(page);
        state.has_more = state.results.len() == PAGE_SIZE as usize;
        state.page = 1;
        tracing::debug!(%query, %search_type, results = state.results.len(), "search applied");
    }
}

pub struct SearchEngine {
    inner: Arc<Inner>,
    debounce: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SearchEngine {
    pub fn new(api: Arc<dyn BookApi>) -> Self {
        Self::with_debounce(api, DEBOUNCE)
    }

    pub fn with_debounce(api: Arc<dyn BookApi>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                generation: AtomicU64::new(0),
                state: Mutex::new(SearchState::default()),
                loading: tokio::sync::Mutex::new(()),
            }),
            debounce,
            pending: Mutex::new(None),
        }
    }

    /// Free-text input; keeps the current search type.
    pub fn set_query(&self, query: impl Into<String>) {
        let search_type = self.inner.state.lock().search_type;
        self.set_search(query, search_type);
    }

    /// Set query and type together, as tapping a genre/theme/style tag does.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_search(&self, query: impl Into<String>, search_type: SearchType) {
        let query = query.into();
        let generation = self.supersede();

        {
            let mut state = self.inner.state.lock();
            state.query = query.clone();
            state.search_type = search_type;
            // no paging until the new query's first page lands
            state.has_more = false;
            if query.trim().chars().count() < MIN_QUERY_LEN {
                state.results.clear();
                state.page = 0;
                return;
            }
        }

        let inner = self.inner.clone();
        let debounce = self.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            inner.run_search(generation, query, search_type).await;
        });
        *self.pending.lock() = Some(handle);
    }

    /// Search for books releasing on `date`.
    pub fn search_by_date(&self, date: NaiveDate) {
        self.set_search(date.format("%Y-%m-%d").to_string(), SearchType::Date);
    }

    /// Drop the pending search and ignore any reply still in flight.
    pub fn cancel(&self) {
        self.supersede();
    }

    fn supersede(&self) -> u64 {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Fetch the next page of the current query and append unseen results.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load_more(&self) {
        let _loading = self.inner.loading.lock().await;
        let generation = self.inner.generation.load(Ordering::SeqCst);
        let (query, search_type, offset) = {
            let state = self.inner.state.lock();
            if !state.has_more {
                return;
            }
            (state.query.clone(), state.search_type, state.page * PAGE_SIZE)
        };

        let page = match self
            .inner
            .api
            .search_books(&query, PAGE_SIZE, offset, search_type)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(error = %e, %query, offset, "failed to load more search results");
                return;
            }
        };

        let mut state = self.inner.state.lock();
        if !self.inner.is_current(generation) {
            tracing::debug!(%query, offset, "discarding page of superseded search");
            return;
        }
        let fresh = filter_new(&state.results, page);
        state.has_more = fresh.len() == PAGE_SIZE as usize;
        state.results.extend(fresh);
        state.page += 1;
    }

    /// Wait until the pending search, if any, has run.
    pub async fn wait_idle(&self) {
        let handle = self.pending.lock().take();
        if let Some(handle) = handle {
            match handle.await {
                Err(e) if !e.is_cancelled() => tracing::error!(error = %e, "search task failed"),
                _ => {}
            }
        }
    }

    pub fn state(&self) -> SearchState {
        self.inner.state.lock().clone()
    }

    /// True while a debounced search is waiting or its request is in flight.
    pub fn is_searching(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for SearchEngine {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }
}
