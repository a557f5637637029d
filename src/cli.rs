use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::models::{Category, SearchType};

/// Discover upcoming books, follow authors and keep a release calendar.
#[derive(Parser, Debug, Clone)]
#[command(name = "book_discovery")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the first page of every feed.
    Discover {
        /// Only this feed (recommended, this-week, next-month, trending, released).
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Page further into one feed.
    More {
        category: Category,
        /// Number of extra pages to load.
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },

    /// Search books.
    Search {
        query: String,
        /// general, genre, writingStyle, theme or date.
        #[arg(short = 't', long, default_value = "general")]
        search_type: SearchType,
        /// Total pages to fetch.
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },

    /// Release dates of favorited books.
    Calendar {
        /// Only books releasing on this day (YYYY-MM-DD).
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Start of the upcoming list; defaults to today.
        #[arg(short, long, conflicts_with = "date")]
        from: Option<NaiveDate>,
    },

    /// Favorite a book, or unfavorite it if it already is.
    Favorite { book_id: String },

    /// List genres; `--set` replaces the favorite genres.
    Genres {
        #[arg(long)]
        set: Vec<String>,
    },

    /// List favorite authors, or replace them.
    Authors {
        /// Comma separated author ids.
        #[arg(long, value_delimiter = ',', conflicts_with = "clear")]
        set: Option<Vec<String>>,
        #[arg(long)]
        clear: bool,
    },

    /// Look up authors by name.
    FindAuthor { query: String },

    /// Send feedback to the developers.
    Feedback { text: String },

    /// Show or change the avatar stored on this device.
    Avatar { name: Option<String> },

    /// First-run setup: pick favorite genres and authors.
    Setup {
        #[arg(long = "genre")]
        genres: Vec<String>,
        #[arg(long = "author")]
        authors: Vec<String>,
    },
}
