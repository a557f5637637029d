//! Paginated, de-duplicated category feeds.
//!
//! Every category keeps its own sequence, offset and has-more flag. All five
//! categories follow one policy: a page is filtered against the category's
//! current sequence, and `has_more` is derived from the raw page length.
//!
//! Each category's state sits behind its own async mutex that stays locked
//! for the whole fetch, so overlapping `load_more` calls on one category run
//! one after the other and each sees the offset left by the previous one.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api_client::BookApi;
use crate::domain::dedup::{DedupContext, filter_new, unique_page};
use crate::domain::models::{Book, Category, CategoryFeedState, PAGE_SIZE};

pub struct CategoryFeedStore {
    api: Arc<dyn BookApi>,
    dedup: DedupContext,
    user_id: Option<String>,
    feeds: HashMap<Category, Mutex<CategoryFeedState>>,
}

impl CategoryFeedStore {
    pub fn new(api: Arc<dyn BookApi>, dedup: DedupContext, user_id: Option<String>) -> Self {
        let feeds = Category::ALL
            .into_iter()
            .map(|c| (c, Mutex::new(CategoryFeedState::default())))
            .collect();
        Self {
            api,
            dedup,
            user_id,
            feeds,
        }
    }

    fn feed(&self, category: Category) -> &Mutex<CategoryFeedState> {
        // every category is inserted in `new`
        &self.feeds[&category]
    }

    pub fn dedup(&self) -> &DedupContext {
        &self.dedup
    }

    /// Install a first page fetched elsewhere (the initial aggregate load).
    pub async fn seed(&self, category: Category, page: Vec<Book>) {
        let raw_len = page.len();
        let books = unique_page(page);
        self.dedup.record(&books);
        let mut state = self.feed(category).lock().await;
        *state = CategoryFeedState {
            books,
            offset: PAGE_SIZE,
            has_more: raw_len == PAGE_SIZE as usize,
        };
    }

    /// Re-fetch the first page and replace the category's sequence.
    ///
    /// `user_id` overrides the user the store was built with.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn refresh(&self, category: Category, user_id: Option<&str>) {
        let user_id = user_id.or(self.user_id.as_deref());
        let mut state = self.feed(category).lock().await;
        let page = match self.api.fetch_category(category, PAGE_SIZE, 0, user_id).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(error = %e, %category, "failed to refresh feed");
                return;
            }
        };
        let raw_len = page.len();
        let books = unique_page(page);
        self.dedup.record(&books);
        tracing::debug!(%category, raw_len, kept = books.len(), "feed refreshed");
        *state = CategoryFeedState {
            books,
            offset: PAGE_SIZE,
            has_more: raw_len == PAGE_SIZE as usize,
        };
    }

    /// Fetch the page at the current offset and append the books not yet shown.
    ///
    /// Does nothing, and sends nothing, once the feed is exhausted.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load_more(&self, category: Category) {
        let mut state = self.feed(category).lock().await;
        if !state.has_more {
            tracing::debug!(%category, "feed exhausted, skipping fetch");
            return;
        }
        let offset = state.offset;
        let user_id = self.user_id.as_deref();
        let page = match self
            .api
            .fetch_category(category, PAGE_SIZE, offset, user_id)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(error = %e, %category, offset, "failed to load more books");
                return;
            }
        };
        let raw_len = page.len();
        let fresh = filter_new(&state.books, page);
        self.dedup.record(&fresh);
        tracing::debug!(%category, offset, raw_len, appended = fresh.len(), "feed page loaded");

        state.books.extend(fresh);
        state.offset += PAGE_SIZE;
        state.has_more = raw_len == PAGE_SIZE as usize;
        if !state.has_more {
            tracing::info!(%category, total = state.books.len(), "no more books available");
        }
    }

    pub async fn snapshot(&self, category: Category) -> CategoryFeedState {
        self.feed(category).lock().await.clone()
    }

    pub async fn books(&self, category: Category) -> Vec<Book> {
        self.feed(category).lock().await.books.clone()
    }

    pub async fn has_more(&self, category: Category) -> bool {
        self.feed(category).lock().await.has_more
    }
}
