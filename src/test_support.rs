//! In-memory `BookApi` with scripted responses and a call log.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::api_client::BookApi;
use crate::domain::models::{
    Author, Book, Category, FavoriteRecord, LoginResponse, SearchType, User,
};
use crate::error::{ApiError, ApiResult};

pub fn book(id: &str) -> Book {
    Book {
        id: id.to_string(),
        title: format!("Title {id}"),
        subtitle: None,
        authors: vec![format!("Author of {id}")],
        cover_image: None,
        main_genre: None,
        genres: Vec::new(),
        themes: Vec::new(),
        writing_styles: Vec::new(),
        published_date: None,
        description: None,
        purchase_link: None,
    }
}

pub fn dated_book(id: &str, y: i32, m: u32, d: u32) -> Book {
    Book {
        published_date: NaiveDate::from_ymd_opt(y, m, d),
        ..book(id)
    }
}

/// `n` books with ids `{prefix}{start}..{prefix}{start + n}`.
pub fn books(prefix: &str, start: usize, n: usize) -> Vec<Book> {
    (start..start + n)
        .map(|i| book(&format!("{prefix}{i}")))
        .collect()
}

pub fn author(id: &str) -> Author {
    Author {
        id: id.to_string(),
        name: format!("Name {id}"),
        biography: None,
        genres_written: Vec::new(),
        writing_styles: Vec::new(),
        image_url: None,
        book_ids: Vec::new(),
    }
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        favorite_genres: Vec::new(),
        favorite_authors: Vec::new(),
        device_id: None,
        push_token: None,
        time_zone: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login { device_id: String },
    Search { query: String, offset: u32, search_type: SearchType },
    Category { category: Category, offset: u32, user_id: Option<String> },
    FetchUser(String),
    UpdateFavorites { genres: Vec<String>, authors: Vec<String> },
    BooksByIds(Vec<String>),
    Favorites(String),
    SaveFavorite { book_id: String },
    RemoveFavorite(String),
    Genres,
    SearchAuthors(String),
    AuthorsByIds(Vec<String>),
    Feedback(String),
}

fn scripted_failure(what: &str) -> ApiError {
    ApiError::InvalidInput(format!("scripted failure: {what}"))
}

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    category_pages: Mutex<HashMap<Category, VecDeque<Option<Vec<Book>>>>>,
    search_pages: Mutex<VecDeque<Option<Vec<Book>>>>,
    catalog: Mutex<HashMap<String, Book>>,
    authors: Mutex<HashMap<String, Author>>,
    users: Mutex<HashMap<String, User>>,
    login: Mutex<Option<LoginResponse>>,
    favorites: Mutex<Vec<FavoriteRecord>>,
    genres: Mutex<Vec<String>>,
    next_favorite: Mutex<u32>,
    failing: Mutex<HashSet<&'static str>>,
    search_delay: Mutex<Option<Duration>>,
    update_delay: Mutex<Option<Duration>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next page a category fetch returns; unqueued fetches return `[]`.
    pub fn push_category_page(&self, category: Category, page: Vec<Book>) {
        self.category_pages
            .lock()
            .entry(category)
            .or_default()
            .push_back(Some(page));
    }

    /// Queue a failing category fetch.
    pub fn push_category_error(&self, category: Category) {
        self.category_pages
            .lock()
            .entry(category)
            .or_default()
            .push_back(None);
    }

    pub fn push_search_page(&self, page: Vec<Book>) {
        self.search_pages.lock().push_back(Some(page));
    }

    /// Every search call sleeps this long before answering.
    pub fn set_search_delay(&self, delay: Duration) {
        *self.search_delay.lock() = Some(delay);
    }

    /// Every favorites update sleeps this long before answering.
    pub fn set_update_delay(&self, delay: Duration) {
        *self.update_delay.lock() = Some(delay);
    }

    pub fn push_search_error(&self) {
        self.search_pages.lock().push_back(None);
    }

    pub fn add_books(&self, books: impl IntoIterator<Item = Book>) {
        let mut catalog = self.catalog.lock();
        for b in books {
            catalog.insert(b.id.clone(), b);
        }
    }

    pub fn add_authors(&self, authors: impl IntoIterator<Item = Author>) {
        let mut all = self.authors.lock();
        for a in authors {
            all.insert(a.id.clone(), a);
        }
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().insert(user.id.clone(), user);
    }

    pub fn add_favorite_record(&self, record: FavoriteRecord) {
        self.favorites.lock().push(record);
    }

    pub fn set_login(&self, response: LoginResponse) {
        *self.login.lock() = Some(response);
    }

    pub fn set_genres(&self, genres: &[&str]) {
        *self.genres.lock() = genres.iter().map(|g| g.to_string()).collect();
    }

    /// Make every call of the named operation fail until `recover` is called.
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.failing.lock().remove(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn category_calls(&self, category: Category) -> Vec<u32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Category { category: c, offset, .. } if *c == category => Some(*offset),
                _ => None,
            })
            .collect()
    }

    pub fn search_offsets(&self) -> Vec<u32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Search { offset, .. } => Some(*offset),
                _ => None,
            })
            .collect()
    }

    pub fn favorite_records(&self) -> Vec<FavoriteRecord> {
        self.favorites.lock().clone()
    }

    fn log(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn check(&self, operation: &'static str) -> ApiResult<()> {
        if self.failing.lock().contains(operation) {
            Err(scripted_failure(operation))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl BookApi for FakeApi {
    async fn device_login(
        &self,
        device_id: &str,
        _push_token: Option<&str>,
        _time_zone: &str,
    ) -> ApiResult<LoginResponse> {
        self.log(Call::Login {
            device_id: device_id.to_string(),
        });
        self.check("device_login")?;
        self.login
            .lock()
            .clone()
            .ok_or_else(|| scripted_failure("no login scripted"))
    }

    async fn search_books(
        &self,
        query: &str,
        _limit: u32,
        offset: u32,
        search_type: SearchType,
    ) -> ApiResult<Vec<Book>> {
        self.log(Call::Search {
            query: query.to_string(),
            offset,
            search_type,
        });
        let next = self.search_pages.lock().pop_front();
        let delay = *self.search_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match next {
            Some(Some(page)) => Ok(page),
            Some(None) => Err(scripted_failure("search")),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_category(
        &self,
        category: Category,
        _limit: u32,
        offset: u32,
        user_id: Option<&str>,
    ) -> ApiResult<Vec<Book>> {
        self.log(Call::Category {
            category,
            offset,
            user_id: user_id.map(str::to_string),
        });
        let next = self
            .category_pages
            .lock()
            .get_mut(&category)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Some(page)) => Ok(page),
            Some(None) => Err(scripted_failure(category.as_str())),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_user(&self, user_id: &str) -> ApiResult<User> {
        self.log(Call::FetchUser(user_id.to_string()));
        self.check("fetch_user")?;
        self.users
            .lock()
            .get(user_id)
            .cloned()
            .ok_or_else(|| scripted_failure("unknown user"))
    }

    async fn update_favorites(
        &self,
        _user_id: &str,
        favorite_genres: &[String],
        favorite_authors: &[String],
    ) -> ApiResult<()> {
        self.log(Call::UpdateFavorites {
            genres: favorite_genres.to_vec(),
            authors: favorite_authors.to_vec(),
        });
        let delay = *self.update_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check("update_favorites")
    }

    async fn books_by_ids(&self, book_ids: &[String]) -> ApiResult<Vec<Book>> {
        if book_ids.is_empty() {
            return Err(ApiError::InvalidInput("bookIds is empty".into()));
        }
        self.log(Call::BooksByIds(book_ids.to_vec()));
        if self.check("books_by_ids").is_err() {
            return Ok(Vec::new());
        }
        let catalog = self.catalog.lock();
        Ok(book_ids
            .iter()
            .filter_map(|id| catalog.get(id).cloned())
            .collect())
    }

    async fn favorites(&self, user_id: &str) -> ApiResult<Vec<FavoriteRecord>> {
        self.log(Call::Favorites(user_id.to_string()));
        if self.check("favorites").is_err() {
            return Ok(Vec::new());
        }
        Ok(self
            .favorites
            .lock()
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_favorite(&self, user_id: &str, book_id: &str) -> ApiResult<String> {
        self.log(Call::SaveFavorite {
            book_id: book_id.to_string(),
        });
        self.check("save_favorite")?;
        let mut next = self.next_favorite.lock();
        *next += 1;
        let id = format!("fav-{}", *next);
        self.favorites.lock().push(FavoriteRecord {
            id: id.clone(),
            user_id: user_id.to_string(),
            book_id: book_id.to_string(),
        });
        Ok(id)
    }

    async fn remove_favorite(&self, favorite_id: &str) -> ApiResult<()> {
        self.log(Call::RemoveFavorite(favorite_id.to_string()));
        self.check("remove_favorite")?;
        self.favorites.lock().retain(|f| f.id != favorite_id);
        Ok(())
    }

    async fn genres(&self) -> ApiResult<Vec<String>> {
        self.log(Call::Genres);
        self.check("genres")?;
        Ok(self.genres.lock().clone())
    }

    async fn search_authors(&self, query: &str, limit: u32) -> ApiResult<Vec<Author>> {
        self.log(Call::SearchAuthors(query.to_string()));
        self.check("search_authors")?;
        let needle = query.to_lowercase();
        let mut found: Vec<Author> = self
            .authors
            .lock()
            .values()
            .filter(|a| a.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn authors_by_ids(&self, author_ids: &[String]) -> ApiResult<Vec<Author>> {
        self.log(Call::AuthorsByIds(author_ids.to_vec()));
        if self.check("authors_by_ids").is_err() {
            return Ok(Vec::new());
        }
        let all = self.authors.lock();
        Ok(author_ids
            .iter()
            .filter_map(|id| all.get(id).cloned())
            .collect())
    }

    async fn submit_feedback(&self, _user_id: &str, feedback: &str) -> ApiResult<()> {
        self.log(Call::Feedback(feedback.to_string()));
        self.check("submit_feedback")
    }
}
