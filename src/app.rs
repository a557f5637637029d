//! Wires the stores together for one logged-in session.

use std::sync::Arc;

use crate::api_client::BookApi;
use crate::domain::dedup::DedupContext;
use crate::favorites::FavoritesStore;
use crate::feed::CategoryFeedStore;
use crate::loader::{InitialState, load_initial_state};
use crate::profile::UserProfileStore;
use crate::search::SearchEngine;
use crate::session::{Session, SessionBootstrapper};
use crate::storage::LocalStore;

pub struct App {
    pub session: Session,
    pub feeds: CategoryFeedStore,
    pub favorites: FavoritesStore,
    pub profile: UserProfileStore,
    pub search: SearchEngine,
}

impl App {
    /// Log in, load the initial state and build every store from it.
    pub async fn launch(
        api: Arc<dyn BookApi>,
        store: Arc<dyn LocalStore>,
        push_token: Option<&str>,
        time_zone: &str,
    ) -> anyhow::Result<Self> {
        let session = SessionBootstrapper::new(api.clone(), store)
            .bootstrap(push_token, time_zone)
            .await?;
        let initial = load_initial_state(api.as_ref(), session.user_id()).await?;
        Ok(Self::from_initial_state(api, session, initial).await)
    }

    pub async fn from_initial_state(api: Arc<dyn BookApi>, session: Session, initial: InitialState) -> Self {
        let InitialState {
            user,
            favorite_authors,
            genres,
            favorites,
            categories,
        } = initial;

        let feeds = CategoryFeedStore::new(api.clone(), DedupContext::new(), Some(user.id.clone()));
        for (category, page) in categories {
            feeds.seed(category, page).await;
        }

        let profile = UserProfileStore::new(
            api.clone(),
            user.id.clone(),
            genres,
            user.favorite_genres.clone(),
            favorite_authors,
        );

        Self {
            session: Session { user, ..session },
            feeds,
            favorites: FavoritesStore::new(api.clone(), favorites),
            profile,
            search: SearchEngine::new(api),
        }
    }

    pub fn user_id(&self) -> &str {
        self.session.user_id()
    }
}
