use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::domain::models::{Author, Book, Category, FavoriteRecord, LoginResponse, SearchType, User};
use crate::error::{ApiError, ApiResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations the stores need from the backend.
///
/// `ApiClient` is the HTTP implementation; tests substitute an in-memory one.
#[async_trait::async_trait]
pub trait BookApi: Send + Sync {
    async fn device_login(
        &self,
        device_id: &str,
        push_token: Option<&str>,
        time_zone: &str,
    ) -> ApiResult<LoginResponse>;

    async fn search_books(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
        search_type: SearchType,
    ) -> ApiResult<Vec<Book>>;

    async fn fetch_category(
        &self,
        category: Category,
        limit: u32,
        offset: u32,
        user_id: Option<&str>,
    ) -> ApiResult<Vec<Book>>;

    async fn fetch_user(&self, user_id: &str) -> ApiResult<User>;

    /// Replaces both favorite lists at once; the endpoint has no partial update.
    async fn update_favorites(
        &self,
        user_id: &str,
        favorite_genres: &[String],
        favorite_authors: &[String],
    ) -> ApiResult<()>;

    /// Empty `book_ids` is rejected; transport failures yield an empty list.
    async fn books_by_ids(&self, book_ids: &[String]) -> ApiResult<Vec<Book>>;

    /// Transport failures yield an empty list.
    async fn favorites(&self, user_id: &str) -> ApiResult<Vec<FavoriteRecord>>;

    /// Returns the server-issued favorite id.
    async fn save_favorite(&self, user_id: &str, book_id: &str) -> ApiResult<String>;

    async fn remove_favorite(&self, favorite_id: &str) -> ApiResult<()>;

    async fn genres(&self) -> ApiResult<Vec<String>>;

    async fn search_authors(&self, query: &str, limit: u32) -> ApiResult<Vec<Author>>;

    /// Transport failures yield an empty list.
    async fn authors_by_ids(&self, author_ids: &[String]) -> ApiResult<Vec<Author>>;

    async fn submit_feedback(&self, user_id: &str, feedback: &str) -> ApiResult<()>;
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new client with the given base URL (e.g. "https://books.example.com").
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url_str = base_url.into();
        tracing::debug!(base_url = %base_url_str, ?timeout, "creating ApiClient");
        Ok(ApiClient {
            base_url: base_url_str.trim_end_matches('/').to_string(),
            api_key: None,
            client,
        })
    }

    /// Return a client that sends the provided key in the `api-key` header
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn auth_header(&self) -> Option<(&'static str, &str)> {
        self.api_key.as_deref().map(|k| ("api-key", k))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = self.url(path);
        tracing::debug!(%url, %method, "sending request");
        let req = self.client.request(method, &url);
        match self.auth_header() {
            Some((k, v)) => req.header(k, v),
            None => req,
        }
    }

    async fn read_json<T: DeserializeOwned>(req: reqwest::RequestBuilder) -> ApiResult<T> {
        let resp = req.send().await?;
        let status = resp.error_for_status()?;
        let body = status.text().await?;
        match serde_json::from_str::<T>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                let snippet_len = body.len().min(2000);
                let snippet = body.get(..snippet_len).unwrap_or_default();
                tracing::error!(error = %e, body_snippet = %snippet, "failed to parse response");
                Err(e.into())
            }
        }
    }

    async fn send_unit(req: reqwest::RequestBuilder) -> ApiResult<()> {
        req.send().await?.error_for_status()?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ApiResult<T> {
        Self::read_json(self.request(reqwest::Method::GET, path).query(query)).await
    }
}

/// Query pairs for a category page. `userId` is only sent to endpoints that use it.
pub fn category_query(
    category: Category,
    limit: u32,
    offset: u32,
    user_id: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut q = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
    if category.takes_user_id() {
        if let Some(user_id) = user_id {
            q.push(("userId", user_id.to_string()));
        }
    }
    q
}

/// The save-favorite endpoint answers either with the bare id or with the
/// inserted document; accept both.
pub fn favorite_id_from_response(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => ["insertedId", "_id", "favoritedId", "id"]
            .iter()
            .find_map(|k| map.get(*k))
            .and_then(favorite_id_from_response),
        _ => None,
    }
}

#[async_trait::async_trait]
impl BookApi for ApiClient {
    /// POST /api/device_login
    #[tracing::instrument(level = "debug", skip(self, push_token))]
    async fn device_login(
        &self,
        device_id: &str,
        push_token: Option<&str>,
        time_zone: &str,
    ) -> ApiResult<LoginResponse> {
        let body = json!({
            "deviceId": device_id,
            "expoPushToken": push_token,
            "timeZone": time_zone,
        });
        Self::read_json(
            self.request(reqwest::Method::POST, "/api/device_login")
                .json(&body),
        )
        .await
    }

    /// GET /api/search
    #[tracing::instrument(level = "debug", skip(self))]
    async fn search_books(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
        search_type: SearchType,
    ) -> ApiResult<Vec<Book>> {
        self.get_json(
            "/api/search",
            &[
                ("query", query.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("searchType", search_type.as_str().to_string()),
            ],
        )
        .await
    }

    #[tracing::instrument(level = "debug", skip(self), fields(path = category.path()))]
    async fn fetch_category(
        &self,
        category: Category,
        limit: u32,
        offset: u32,
        user_id: Option<&str>,
    ) -> ApiResult<Vec<Book>> {
        let q = category_query(category, limit, offset, user_id);
        self.get_json(category.path(), &q).await
    }

    /// GET /api/users/:id
    #[tracing::instrument(level = "debug", skip(self))]
    async fn fetch_user(&self, user_id: &str) -> ApiResult<User> {
        Self::read_json(self.request(reqwest::Method::GET, &format!("/api/users/{}", user_id)))
            .await
    }

    /// PATCH /api/users/:id
    #[tracing::instrument(level = "debug", skip(self))]
    async fn update_favorites(
        &self,
        user_id: &str,
        favorite_genres: &[String],
        favorite_authors: &[String],
    ) -> ApiResult<()> {
        let body = json!({
            "favoriteGenres": favorite_genres,
            "favoriteAuthors": favorite_authors,
        });
        Self::send_unit(
            self.request(reqwest::Method::PATCH, &format!("/api/users/{}", user_id))
                .json(&body),
        )
        .await
    }

    /// POST /api/books/by-ids
    #[tracing::instrument(level = "debug", skip(self), fields(count = book_ids.len()))]
    async fn books_by_ids(&self, book_ids: &[String]) -> ApiResult<Vec<Book>> {
        if book_ids.is_empty() {
            return Err(ApiError::InvalidInput("bookIds is empty".into()));
        }
        let req = self
            .request(reqwest::Method::POST, "/api/books/by-ids")
            .json(&json!({ "bookIds": book_ids }));
        match Self::read_json(req).await {
            Ok(books) => Ok(books),
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch books by ids");
                Ok(Vec::new())
            }
        }
    }

    /// GET /api/favorites/:userId
    #[tracing::instrument(level = "debug", skip(self))]
    async fn favorites(&self, user_id: &str) -> ApiResult<Vec<FavoriteRecord>> {
        let req = self.request(reqwest::Method::GET, &format!("/api/favorites/{}", user_id));
        match Self::read_json::<Option<Vec<FavoriteRecord>>>(req).await {
            Ok(records) => Ok(records.unwrap_or_default()),
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch favorites");
                Ok(Vec::new())
            }
        }
    }

    /// POST /api/favorites
    #[tracing::instrument(level = "debug", skip(self))]
    async fn save_favorite(&self, user_id: &str, book_id: &str) -> ApiResult<String> {
        let req = self
            .request(reqwest::Method::POST, "/api/favorites")
            .json(&json!({ "userId": user_id, "bookId": book_id }));
        let value: Value = Self::read_json(req).await?;
        favorite_id_from_response(&value).ok_or_else(|| {
            ApiError::InvalidInput(format!("favorite response carried no id: {}", value))
        })
    }

    /// DELETE /api/favorites/:id
    #[tracing::instrument(level = "debug", skip(self))]
    async fn remove_favorite(&self, favorite_id: &str) -> ApiResult<()> {
        Self::send_unit(self.request(
            reqwest::Method::DELETE,
            &format!("/api/favorites/{}", favorite_id),
        ))
        .await
    }

    /// GET /api/genres
    #[tracing::instrument(level = "debug", skip(self))]
    async fn genres(&self) -> ApiResult<Vec<String>> {
        Self::read_json(self.request(reqwest::Method::GET, "/api/genres")).await
    }

    /// GET /api/authors/search
    #[tracing::instrument(level = "debug", skip(self))]
    async fn search_authors(&self, query: &str, limit: u32) -> ApiResult<Vec<Author>> {
        self.get_json(
            "/api/authors/search",
            &[("query", query.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    /// GET /api/authors/by-ids
    #[tracing::instrument(level = "debug", skip(self), fields(count = author_ids.len()))]
    async fn authors_by_ids(&self, author_ids: &[String]) -> ApiResult<Vec<Author>> {
        let joined = author_ids.join(",");
        match self
            .get_json("/api/authors/by-ids", &[("authorIds", joined)])
            .await
        {
            Ok(authors) => Ok(authors),
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch authors by ids");
                Ok(Vec::new())
            }
        }
    }

    /// POST /feedback
    #[tracing::instrument(level = "debug", skip(self, feedback))]
    async fn submit_feedback(&self, user_id: &str, feedback: &str) -> ApiResult<()> {
        Self::send_unit(
            self.request(reqwest::Method::POST, "/feedback")
                .json(&json!({ "userId": user_id, "feedback": feedback })),
        )
        .await
    }
}
