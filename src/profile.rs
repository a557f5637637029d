//! Favorite genres and authors, written through to the backend.
//!
//! The update endpoint always takes both lists, so every partial update sends
//! the untouched list's current value alongside the changed one. Updates are
//! serialized so the pair sent is never built from stale state.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::api_client::BookApi;
use crate::domain::models::Author;

pub const AUTHOR_SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq)]
struct ProfileState {
    favorite_genres: Vec<String>,
    favorite_authors: Vec<Author>,
}

pub struct UserProfileStore {
    api: Arc<dyn BookApi>,
    user_id: String,
    genres: Vec<String>,
    state: Mutex<ProfileState>,
    writes: tokio::sync::Mutex<()>,
}

/// Order-preserving de-duplication; favorite genres behave as a set.
fn unique_genres(genres: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(genres.len());
    for g in genres {
        if !out.contains(&g) {
            out.push(g);
        }
    }
    out
}

impl UserProfileStore {
    pub fn new(
        api: Arc<dyn BookApi>,
        user_id: impl Into<String>,
        genres: Vec<String>,
        favorite_genres: Vec<String>,
        favorite_authors: Vec<Author>,
    ) -> Self {
        Self {
            api,
            user_id: user_id.into(),
            genres,
            state: Mutex::new(ProfileState {
                favorite_genres: unique_genres(favorite_genres),
                favorite_authors,
            }),
            writes: tokio::sync::Mutex::new(()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Every genre the backend knows about.
    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn favorite_genres(&self) -> Vec<String> {
        self.state.lock().favorite_genres.clone()
    }

    pub fn favorite_authors(&self) -> Vec<Author> {
        self.state.lock().favorite_authors.clone()
    }

    fn favorite_author_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .favorite_authors
            .iter()
            .map(|a| a.id.clone())
            .collect()
    }

    /// Returns whether the update was applied.
    #[tracing::instrument(level = "debug", skip(self), fields(user_id = %self.user_id))]
    pub async fn update_favorite_genres(&self, genres: Vec<String>) -> bool {
        let _write = self.writes.lock().await;
        self.update_genres_locked(genres).await
    }

    /// Returns whether the update was applied.
    #[tracing::instrument(level = "debug", skip(self), fields(user_id = %self.user_id))]
    pub async fn update_favorite_authors(&self, author_ids: Vec<String>) -> bool {
        let _write = self.writes.lock().await;
        self.update_authors_locked(author_ids).await
    }

    /// The new list is built under the write lock, so overlapping toggles
    /// each see the previous one's result.
    #[tracing::instrument(level = "debug", skip(self), fields(user_id = %self.user_id))]
    pub async fn toggle_favorite_genre(&self, genre: &str) -> bool {
        let _write = self.writes.lock().await;
        let mut genres = self.favorite_genres();
        match genres.iter().position(|g| g == genre) {
            Some(i) => {
                genres.remove(i);
            }
            None => genres.push(genre.to_string()),
        }
        self.update_genres_locked(genres).await
    }

    #[tracing::instrument(level = "debug", skip(self), fields(user_id = %self.user_id))]
    pub async fn toggle_favorite_author(&self, author_id: &str) -> bool {
        let _write = self.writes.lock().await;
        let mut ids = self.favorite_author_ids();
        match ids.iter().position(|id| id == author_id) {
            Some(i) => {
                ids.remove(i);
            }
            None => ids.push(author_id.to_string()),
        }
        self.update_authors_locked(ids).await
    }

    // callers hold `writes`
    async fn update_genres_locked(&self, genres: Vec<String>) -> bool {
        let genres = unique_genres(genres);
        let author_ids = self.favorite_author_ids();
        if let Err(e) = self
            .api
            .update_favorites(&self.user_id, &genres, &author_ids)
            .await
        {
            tracing::error!(error = %e, "failed to update favorite genres");
            return false;
        }
        self.state.lock().favorite_genres = genres;
        true
    }

    // callers hold `writes`
    async fn update_authors_locked(&self, author_ids: Vec<String>) -> bool {
        let genres = self.favorite_genres();
        if let Err(e) = self
            .api
            .update_favorites(&self.user_id, &genres, &author_ids)
            .await
        {
            tracing::error!(error = %e, "failed to update favorite authors");
            return false;
        }

        let authors = if author_ids.is_empty() {
            Vec::new()
        } else {
            match self.api.authors_by_ids(&author_ids).await {
                Ok(authors) => authors,
                Err(e) => {
                    tracing::error!(error = %e, "failed to fetch favorite authors");
                    Vec::new()
                }
            }
        };
        self.state.lock().favorite_authors = authors;
        true
    }

    /// Author name lookup; an empty query returns nothing without a request.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn search_authors(&self, query: &str) -> Vec<Author> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        match self.api.search_authors(query, AUTHOR_SEARCH_LIMIT).await {
            Ok(authors) => authors,
            Err(e) => {
                tracing::error!(error = %e, %query, "failed to search authors");
                Vec::new()
            }
        }
    }

    /// Returns whether the feedback was delivered. Blank text is not sent.
    #[tracing::instrument(level = "debug", skip(self, feedback))]
    pub async fn submit_feedback(&self, feedback: &str) -> bool {
        if feedback.trim().is_empty() {
            return false;
        }
        match self.api.submit_feedback(&self.user_id, feedback).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "failed to send feedback");
                false
            }
        }
    }
}
