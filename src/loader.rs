//! One-shot fan-out of everything the home screen needs.

use std::collections::{BTreeMap, HashMap};

use anyhow::Context;

use crate::api_client::BookApi;
use crate::domain::models::{Author, Book, Category, FavoriteBook, PAGE_SIZE, User};
use crate::error::ApiResult;

#[derive(Debug, Clone, PartialEq)]
pub struct InitialState {
    pub user: User,
    pub favorite_authors: Vec<Author>,
    pub genres: Vec<String>,
    pub favorites: Vec<FavoriteBook>,
    /// First page of every category, unfiltered.
    pub categories: BTreeMap<Category, Vec<Book>>,
}

async fn first_page(api: &dyn BookApi, category: Category, user_id: &str) -> ApiResult<Vec<Book>> {
    let books = api
        .fetch_category(category, PAGE_SIZE, 0, Some(user_id))
        .await?;
    tracing::debug!(%category, count = books.len(), "loaded first page");
    Ok(books)
}

async fn favorite_authors(api: &dyn BookApi, author_ids: &[String]) -> ApiResult<Vec<Author>> {
    if author_ids.is_empty() {
        return Ok(Vec::new());
    }
    api.authors_by_ids(author_ids).await
}

/// Favorite records joined with their books, in record order.
///
/// Never fails; a broken lookup yields no favorites.
async fn favorite_books(api: &dyn BookApi, user_id: &str) -> ApiResult<Vec<FavoriteBook>> {
    let records = match api.favorites(user_id).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load favorites");
            return Ok(Vec::new());
        }
    };
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = records.iter().map(|r| r.book_id.clone()).collect();
    let mut by_id: HashMap<String, Book> = match api.books_by_ids(&ids).await {
        Ok(books) => books.into_iter().map(|b| (b.id.clone(), b)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load favorite books");
            return Ok(Vec::new());
        }
    };

    Ok(records
        .into_iter()
        .filter_map(|r| {
            let book = by_id.remove(&r.book_id)?;
            Some(FavoriteBook {
                book,
                favorited_id: r.id,
            })
        })
        .collect())
}

#[tracing::instrument(level = "debug", skip(api))]
pub async fn load_initial_state(api: &dyn BookApi, user_id: &str) -> anyhow::Result<InitialState> {
    let user = api
        .fetch_user(user_id)
        .await
        .with_context(|| format!("Failed to load user {user_id}"))?;

    let (
        favorite_authors,
        genres,
        favorites,
        recommended,
        this_week,
        next_month,
        trending,
        released,
    ) = tokio::try_join!(
        favorite_authors(api, &user.favorite_authors),
        api.genres(),
        favorite_books(api, user_id),
        first_page(api, Category::Recommended, user_id),
        first_page(api, Category::ThisWeek, user_id),
        first_page(api, Category::NextMonth, user_id),
        first_page(api, Category::Trending, user_id),
        first_page(api, Category::Released, user_id),
    )
    .with_context(|| "Failed to load initial data")?;

    let categories = BTreeMap::from([
        (Category::Recommended, recommended),
        (Category::ThisWeek, this_week),
        (Category::NextMonth, next_month),
        (Category::Trending, trending),
        (Category::Released, released),
    ]);
    tracing::info!(
        favorites = favorites.len(),
        genres = genres.len(),
        "initial state loaded"
    );
    Ok(InitialState {
        user,
        favorite_authors,
        genres,
        favorites,
        categories,
    })
}
