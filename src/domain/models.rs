// Wire and domain models shared by the API client and the stores

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed page size for every paginated endpoint.
pub const PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub cover_image: Option<String>,
    pub main_genre: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(rename = "writingStyle", default)]
    pub writing_styles: Vec<String>,
    #[serde(
        deserialize_with = "crate::domain::de::opt_date_from_str",
        default
    )]
    pub published_date: Option<NaiveDate>,
    pub description: Option<String>,
    #[serde(rename = "amazonAffiliateLink")]
    pub purchase_link: Option<String>,
}

impl Book {
    /// First listed author, the way list rows display it.
    pub fn lead_author(&self) -> &str {
        self.authors.first().map(String::as_str).unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub biography: Option<String>,
    #[serde(default)]
    pub genres_written: Vec<String>,
    #[serde(rename = "writingStyle", default)]
    pub writing_styles: Vec<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    #[serde(
        rename = "booksWritten",
        deserialize_with = "crate::domain::de::vec_from_single_or_many",
        default
    )]
    pub book_ids: Vec<String>,
}

/// Server-side record linking a user to a favorited book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub book_id: String,
}

/// A favorited book together with the id needed to remove it again.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteBook {
    pub book: Book,
    pub favorited_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub favorite_authors: Vec<String>,
    pub device_id: Option<String>,
    #[serde(rename = "expoPushToken")]
    pub push_token: Option<String>,
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: Option<User>,
    #[serde(default)]
    pub is_new_user: bool,
}

/// The five server-backed book feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Recommended,
    ThisWeek,
    NextMonth,
    Trending,
    Released,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Recommended,
        Category::ThisWeek,
        Category::NextMonth,
        Category::Trending,
        Category::Released,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Category::Recommended => "/api/recommended-for-you",
            Category::ThisWeek => "/api/books-coming-this-week",
            Category::NextMonth => "/api/books-coming-next-month",
            Category::Trending => "/api/trending-books",
            Category::Released => "/api/books-already-released",
        }
    }

    /// Whether the endpoint personalizes results with a `userId` parameter.
    pub fn takes_user_id(self) -> bool {
        matches!(
            self,
            Category::Recommended | Category::NextMonth | Category::Released
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Recommended => "recommended",
            Category::ThisWeek => "this-week",
            Category::NextMonth => "next-month",
            Category::Trending => "trending",
            Category::Released => "released",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchType {
    #[default]
    General,
    Genre,
    WritingStyle,
    Theme,
    Date,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::General => "general",
            SearchType::Genre => "genre",
            SearchType::WritingStyle => "writingStyle",
            SearchType::Theme => "theme",
            SearchType::Date => "date",
        }
    }
}

impl std::str::FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            SearchType::General,
            SearchType::Genre,
            SearchType::WritingStyle,
            SearchType::Theme,
            SearchType::Date,
        ]
        .into_iter()
        .find(|t| t.as_str() == s)
        .ok_or_else(|| format!("unknown search type: {s}"))
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pagination state of one category feed.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFeedState {
    pub books: Vec<Book>,
    pub offset: u32,
    pub has_more: bool,
}

impl Default for CategoryFeedState {
    fn default() -> Self {
        Self {
            books: Vec::new(),
            offset: 0,
            has_more: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState {
    pub query: String,
    pub search_type: SearchType,
    pub results: Vec<Book>,
    /// Number of pages applied so far; the next page starts at `page * PAGE_SIZE`.
    pub page: u32,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_deserialize_example() {
        let json = r#"{
            "_id": "66a1f0c2e4b0a1b2c3d4e5f6",
            "ISBN": "9780000000001",
            "title": "The Glass Orchard",
            "subtitle": "A Novel",
            "authors": ["Mara Quill", "Ines Dorr"],
            "coverImage": "https://covers.example/1.jpg",
            "mainGenre": "Fantasy",
            "genres": ["Fantasy", "Romance"],
            "themes": ["Identity"],
            "writingStyle": ["Lyrical"],
            "publishedDate": "2025-03-11T00:00:00.000Z",
            "description": "A long description",
            "amazonAffiliateLink": "https://www.amazon.com/dp/B000000001",
            "favoriteCount": 3
        }"#;

        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.id, "66a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(book.lead_author(), "Mara Quill");
        assert_eq!(book.writing_styles, vec!["Lyrical"]);
        assert_eq!(
            book.published_date,
            Some(NaiveDate::from_ymd_opt(2025, 3, 11).unwrap())
        );
        assert_eq!(
            book.purchase_link.as_deref(),
            Some("https://www.amazon.com/dp/B000000001")
        );
    }

    #[test]
    fn sparse_book_uses_defaults() {
        let book: Book =
            serde_json::from_str(r#"{ "_id": "b1", "publishedDate": "soon" }"#).unwrap();
        assert_eq!(book.title, "");
        assert!(book.authors.is_empty());
        assert_eq!(book.lead_author(), "Unknown");
        assert_eq!(book.published_date, None);
    }

    #[test]
    fn author_accepts_single_book_id() {
        let json = r#"{
            "_id": "a1",
            "name": "Mara Quill",
            "biography": "Writes things.",
            "genresWritten": ["Fantasy"],
            "writingStyle": ["Lyrical", "Descriptive"],
            "imageURL": "https://img.example/a1.png",
            "booksWritten": "b1"
        }"#;
        let author: Author = serde_json::from_str(json).unwrap();
        assert_eq!(author.book_ids, vec!["b1"]);
        assert_eq!(author.writing_styles.len(), 2);
    }

    #[test]
    fn login_response_deserialize() {
        let json = r#"{
            "user": {
                "_id": "u1",
                "favoriteGenres": ["Horror"],
                "favoriteAuthors": [],
                "deviceId": "d1",
                "expoPushToken": "ExponentPushToken[x]",
                "timeZone": "Europe/Berlin"
            },
            "isNewUser": true
        }"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert!(resp.is_new_user);
        let user = resp.user.unwrap();
        assert_eq!(user.favorite_genres, vec!["Horror"]);
        assert_eq!(user.time_zone.as_deref(), Some("Europe/Berlin"));
    }

    #[test]
    fn category_round_trips_through_str() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert!("weekly".parse::<Category>().is_err());
    }

    #[test]
    fn search_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&SearchType::WritingStyle).unwrap(),
            "\"writingStyle\""
        );
        assert_eq!(SearchType::default(), SearchType::General);
        assert_eq!("writingStyle".parse::<SearchType>(), Ok(SearchType::WritingStyle));
        assert!("WritingStyle".parse::<SearchType>().is_err());
    }

    #[test]
    fn fresh_feed_believes_more_exists() {
        let state = CategoryFeedState::default();
        assert!(state.has_more);
        assert_eq!(state.offset, 0);
    }
}
