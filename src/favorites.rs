//! The user's favorited books.
//!
//! Adds and removes for the same book are serialized through a per-book async
//! lock, so two quick taps on one heart icon resolve as add-then-remove rather
//! than racing. Local state changes only after the backend confirms.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::api_client::BookApi;
use crate::domain::models::{Book, FavoriteBook};

type BookLock = Arc<tokio::sync::Mutex<()>>;

pub struct FavoritesStore {
    api: Arc<dyn BookApi>,
    books: Mutex<Vec<FavoriteBook>>,
    /// Favorite ids that were removed; a server handing one back is refused.
    retired: Mutex<HashSet<String>>,
    locks: Mutex<HashMap<String, BookLock>>,
}

impl FavoritesStore {
    pub fn new(api: Arc<dyn BookApi>, initial: Vec<FavoriteBook>) -> Self {
        Self {
            api,
            books: Mutex::new(initial),
            retired: Mutex::new(HashSet::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn book_lock(&self, key: &str) -> BookLock {
        self.locks
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Drop the map entry once no other operation holds or waits on it.
    fn release_lock(&self, key: &str, lock: BookLock) {
        let mut locks = self.locks.lock();
        drop(lock);
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }

    pub fn favorites(&self) -> Vec<FavoriteBook> {
        self.books.lock().clone()
    }

    pub fn books(&self) -> Vec<Book> {
        self.books.lock().iter().map(|f| f.book.clone()).collect()
    }

    pub fn is_favorited(&self, book_id: &str) -> bool {
        self.favorited_id(book_id).is_some()
    }

    pub fn favorited_id(&self, book_id: &str) -> Option<String> {
        self.books
            .lock()
            .iter()
            .find(|f| f.book.id == book_id)
            .map(|f| f.favorited_id.clone())
    }

    /// Persist a favorite, then fetch the book and add it locally.
    ///
    /// Returns the server-issued favorite id, or `None` if anything failed.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn add_favorite(&self, user_id: &str, book_id: &str) -> Option<String> {
        let lock = self.book_lock(book_id);
        let added = {
            let _guard = lock.lock().await;
            self.add_locked(user_id, book_id).await
        };
        self.release_lock(book_id, lock);
        added
    }

    /// Delete a favorite by its server id, then drop it locally.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn remove_favorite(&self, favorited_id: &str) -> bool {
        let book_id = self
            .books
            .lock()
            .iter()
            .find(|f| f.favorited_id == favorited_id)
            .map(|f| f.book.id.clone());
        // unknown locally: still ask the server, keyed on the favorite id
        let key = book_id.as_deref().unwrap_or(favorited_id);
        let lock = self.book_lock(key);
        let removed = {
            let _guard = lock.lock().await;
            self.remove_locked(favorited_id).await
        };
        self.release_lock(key, lock);
        removed
    }

    /// Flip the favorite state of a book; returns whether it is favorited afterwards.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn toggle(&self, user_id: &str, book_id: &str) -> bool {
        let lock = self.book_lock(book_id);
        let favorited = {
            let _guard = lock.lock().await;
            match self.favorited_id(book_id) {
                Some(favorited_id) => !self.remove_locked(&favorited_id).await,
                None => self.add_locked(user_id, book_id).await.is_some(),
            }
        };
        self.release_lock(book_id, lock);
        favorited
    }

    async fn add_locked(&self, user_id: &str, book_id: &str) -> Option<String> {
        if let Some(existing) = self.favorited_id(book_id) {
            tracing::debug!(%book_id, "book already favorited");
            return Some(existing);
        }

        let favorited_id = match self.api.save_favorite(user_id, book_id).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, %book_id, "failed to save favorite");
                return None;
            }
        };
        if self.retired.lock().contains(&favorited_id) {
            tracing::warn!(%book_id, %favorited_id, "server reused a removed favorite id");
            // the server stored a record under that id; delete it rather than orphan it
            if let Err(e) = self.api.remove_favorite(&favorited_id).await {
                tracing::error!(error = %e, %book_id, %favorited_id, "left an orphaned favorite on the server");
            }
            return None;
        }

        let book = match self.api.books_by_ids(&[book_id.to_string()]).await {
            Ok(mut found) if !found.is_empty() => found.swap_remove(0),
            Ok(_) => {
                tracing::error!(%book_id, "favorited book not found");
                return None;
            }
            Err(e) => {
                tracing::error!(error = %e, %book_id, "failed to fetch favorited book");
                return None;
            }
        };

        self.books.lock().push(FavoriteBook {
            book,
            favorited_id: favorited_id.clone(),
        });
        tracing::info!(%book_id, %favorited_id, "book favorited");
        Some(favorited_id)
    }

    async fn remove_locked(&self, favorited_id: &str) -> bool {
        if let Err(e) = self.api.remove_favorite(favorited_id).await {
            tracing::error!(error = %e, %favorited_id, "failed to remove favorite");
            return false;
        }
        self.books.lock().retain(|f| f.favorited_id != favorited_id);
        self.retired.lock().insert(favorited_id.to_string());
        tracing::info!(%favorited_id, "favorite removed");
        true
    }
}
