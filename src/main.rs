use std::{path::Path, sync::Arc};

use anyhow::Context;
use book_discovery::{
    api_client::{ApiClient, BookApi},
    app::App,
    calendar,
    cli::{Cli, Command},
    config::Config,
    domain::models::{Book, Category, SearchType},
    session::SessionBootstrapper,
    storage::{LocalStore, SqliteLocalStore},
};
use clap::Parser;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Respect RUST_LOG if set, default to info for our crate and warn for deps.
    let default_filter = format!("{}=info,reqwest=warn,sqlx=warn", env!("CARGO_CRATE_NAME"));
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_level(true)
        .compact()
        .with_writer(std::io::stderr)
        .finish()
        .with(ErrorLayer::default())
        .init();

    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };

    let cli = Cli::parse();
    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting book discovery");

    let store: Arc<dyn LocalStore> =
        Arc::new(SqliteLocalStore::connect(&config.db_connection_string).await?);
    let client = ApiClient::new(&config.api_base_url, config.request_timeout)?
        .with_api_key(&config.api_key);
    tracing::debug!(api_base = %config.api_base_url, "configured API client");
    let api: Arc<dyn BookApi> = Arc::new(client);

    match cli.command {
        Command::Avatar { name } => cmd_avatar(store.as_ref(), name).await,
        Command::Setup { genres, authors } => {
            cmd_setup(api, store, &config, genres, authors).await
        }
        command => {
            let app = App::launch(
                api,
                store,
                config.push_token.as_deref(),
                &config.time_zone,
            )
            .await?;
            if app.session.needs_setup {
                tracing::warn!("favorites not set up yet; run `setup` to personalize recommendations");
            }
            run(&app, command).await
        }
    }
}

async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Discover { category } => {
            let categories: Vec<Category> = match category {
                Some(c) => vec![c],
                None => Category::ALL.to_vec(),
            };
            for category in categories {
                print_feed(app, category).await;
            }
        }
        Command::More { category, pages } => {
            for _ in 0..pages {
                app.feeds.load_more(category).await;
            }
            print_feed(app, category).await;
        }
        Command::Search {
            query,
            search_type,
            pages,
        } => cmd_search(app, query, search_type, pages).await,
        Command::Calendar { date, from } => {
            let favorites = app.favorites.books();
            let books = match date {
                Some(date) => calendar::releasing_on(&favorites, date),
                None => {
                    let from = from.unwrap_or_else(|| chrono::Local::now().date_naive());
                    calendar::upcoming(&favorites, from)
                }
            };
            println!(
                "{} release dates across {} favorites",
                calendar::release_dates(&favorites).len(),
                favorites.len()
            );
            books.iter().for_each(print_book);
        }
        Command::Favorite { book_id } => {
            let before = app.favorites.is_favorited(&book_id);
            let after = app.favorites.toggle(app.user_id(), &book_id).await;
            if before == after {
                anyhow::bail!("Could not update favorite {book_id}");
            }
            if after {
                println!("Favorited {book_id}");
            } else {
                println!("Removed {book_id} from favorites");
            }
        }
        Command::Genres { set } => {
            if !set.is_empty() && !app.profile.update_favorite_genres(set).await {
                anyhow::bail!("Failed to update favorite genres");
            }
            let favorites = app.profile.favorite_genres();
            for genre in app.profile.genres() {
                let mark = if favorites.contains(genre) { '*' } else { ' ' };
                println!("{mark} {genre}");
            }
        }
        Command::Authors { set, clear } => {
            let update = if clear { Some(Vec::new()) } else { set };
            if let Some(ids) = update {
                if !app.profile.update_favorite_authors(ids).await {
                    anyhow::bail!("Failed to update favorite authors");
                }
            }
            for author in app.profile.favorite_authors() {
                println!("{:<26} {}", author.id, author.name);
            }
        }
        Command::FindAuthor { query } => {
            for author in app.profile.search_authors(&query).await {
                println!("{:<26} {}", author.id, author.name);
            }
        }
        Command::Feedback { text } => {
            if !app.profile.submit_feedback(&text).await {
                anyhow::bail!("Feedback was not sent");
            }
            println!("Thanks for the feedback!");
        }
        Command::Avatar { .. } | Command::Setup { .. } => {
            unreachable!("avatar and setup run without launching the app")
        }
    }
    Ok(())
}

async fn cmd_search(app: &App, query: String, search_type: SearchType, pages: u32) {
    app.search.set_search(query, search_type);
    app.search.wait_idle().await;
    for _ in 1..pages {
        app.search.load_more().await;
    }
    let state = app.search.state();
    println!(
        "{} results for {:?} ({}){}",
        state.results.len(),
        state.query,
        state.search_type,
        if state.has_more { ", more available" } else { "" }
    );
    state.results.iter().for_each(print_book);
}

async fn cmd_avatar(store: &dyn LocalStore, name: Option<String>) -> anyhow::Result<()> {
    if let Some(name) = name {
        store.set_avatar(&name).await?;
    }
    match store.avatar().await? {
        Some(avatar) => println!("{avatar}"),
        None => println!("No avatar chosen"),
    }
    Ok(())
}

async fn cmd_setup(
    api: Arc<dyn BookApi>,
    store: Arc<dyn LocalStore>,
    config: &Config,
    genres: Vec<String>,
    authors: Vec<String>,
) -> anyhow::Result<()> {
    let boot = SessionBootstrapper::new(api, store);
    let mut session = boot
        .bootstrap(config.push_token.as_deref(), &config.time_zone)
        .await?;
    boot.complete_setup(&mut session, genres, authors)
        .await
        .with_context(|| "Setup failed")?;
    println!("Setup complete for {}", session.user_id());
    Ok(())
}

async fn print_feed(app: &App, category: Category) {
    let state = app.feeds.snapshot(category).await;
    println!(
        "== {category} ({} books{}) ==",
        state.books.len(),
        if state.has_more { ", more available" } else { "" }
    );
    state.books.iter().for_each(print_book);
}

fn print_book(book: &Book) {
    let date = book
        .published_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    println!("{:<26} {:<10} {} ({})", book.id, date, book.title, book.lead_author());
}
