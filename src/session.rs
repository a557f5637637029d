//! Device identity and login.

use std::sync::Arc;

use anyhow::Context;
use uuid::Uuid;

use crate::api_client::BookApi;
use crate::domain::models::User;
use crate::error::ApiError;
use crate::storage::LocalStore;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub device_id: String,
    pub user: User,
    /// First launch on this device, or the backend reports a brand new user.
    pub needs_setup: bool,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

pub struct SessionBootstrapper {
    api: Arc<dyn BookApi>,
    store: Arc<dyn LocalStore>,
}

impl SessionBootstrapper {
    pub fn new(api: Arc<dyn BookApi>, store: Arc<dyn LocalStore>) -> Self {
        Self { api, store }
    }

    /// Returns the stored device id, generating and persisting one on first run.
    async fn device_id(&self) -> anyhow::Result<(String, bool)> {
        if let Some(id) = self.store.device_id().await? {
            return Ok((id, false));
        }
        let id = Uuid::new_v4().to_string();
        self.store
            .set_device_id(&id)
            .await
            .with_context(|| "Failed to persist device id")?;
        tracing::info!(device_id = %id, "generated new device id");
        Ok((id, true))
    }

    #[tracing::instrument(level = "debug", skip(self, push_token))]
    pub async fn bootstrap(&self, push_token: Option<&str>, time_zone: &str) -> anyhow::Result<Session> {
        let (device_id, first_run) = self.device_id().await?;
        let response = self
            .api
            .device_login(&device_id, push_token, time_zone)
            .await
            .with_context(|| "Device login failed")?;
        let user = response.user.ok_or(ApiError::MissingUser)?;
        self.store
            .set_user_id(&user.id)
            .await
            .with_context(|| "Failed to persist user id")?;

        let needs_setup = response.is_new_user || first_run;
        tracing::info!(user_id = %user.id, is_new_user = response.is_new_user, first_run, "logged in");
        Ok(Session {
            device_id,
            user,
            needs_setup,
        })
    }

    /// Saves the first-run genre and author picks and marks setup done.
    #[tracing::instrument(level = "debug", skip(self, session), fields(user_id = %session.user.id))]
    pub async fn complete_setup(
        &self,
        session: &mut Session,
        genres: Vec<String>,
        author_ids: Vec<String>,
    ) -> anyhow::Result<()> {
        self.api
            .update_favorites(&session.user.id, &genres, &author_ids)
            .await
            .with_context(|| "Failed to save initial favorites")?;
        session.user.favorite_genres = genres;
        session.user.favorite_authors = author_ids;
        session.needs_setup = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::LoginResponse;
    use crate::storage::SqliteLocalStore;
    use crate::test_support::{Call, FakeApi, user};

    async fn setup(is_new_user: bool) -> (Arc<FakeApi>, Arc<SqliteLocalStore>, SessionBootstrapper) {
        let api = Arc::new(FakeApi::new());
        api.set_login(LoginResponse {
            user: Some(user("u1")),
            is_new_user,
        });
        let store = Arc::new(SqliteLocalStore::connect("sqlite::memory:").await.unwrap());
        let boot = SessionBootstrapper::new(api.clone(), store.clone());
        (api, store, boot)
    }

    #[tokio::test]
    async fn first_run_generates_and_persists_device_id() {
        let (api, store, boot) = setup(false).await;
        let session = boot.bootstrap(Some("push-1"), "Europe/Paris").await.unwrap();

        assert!(session.needs_setup);
        assert!(Uuid::parse_str(&session.device_id).is_ok());
        assert_eq!(store.device_id().await.unwrap(), Some(session.device_id.clone()));
        assert_eq!(store.user_id().await.unwrap().as_deref(), Some("u1"));
        assert_eq!(
            api.calls(),
            vec![Call::Login {
                device_id: session.device_id.clone()
            }]
        );
    }

    #[tokio::test]
    async fn returning_device_reuses_id() {
        let (_api, store, boot) = setup(false).await;
        store.set_device_id("device-7").await.unwrap();

        let session = boot.bootstrap(None, "UTC").await.unwrap();
        assert_eq!(session.device_id, "device-7");
        assert!(!session.needs_setup);
    }

    #[tokio::test]
    async fn new_user_on_known_device_needs_setup() {
        let (_api, store, boot) = setup(true).await;
        store.set_device_id("device-7").await.unwrap();
        assert!(boot.bootstrap(None, "UTC").await.unwrap().needs_setup);
    }

    #[tokio::test]
    async fn login_without_user_is_an_error() {
        let api = Arc::new(FakeApi::new());
        api.set_login(LoginResponse {
            user: None,
            is_new_user: false,
        });
        let store = Arc::new(SqliteLocalStore::connect("sqlite::memory:").await.unwrap());
        let boot = SessionBootstrapper::new(api, store.clone());

        let err = boot.bootstrap(None, "UTC").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::MissingUser)));
        assert_eq!(store.user_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_login_keeps_generated_device_id() {
        let (api, store, boot) = setup(false).await;
        api.fail("device_login");
        assert!(boot.bootstrap(None, "UTC").await.is_err());
        assert!(store.device_id().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn complete_setup_writes_favorites() {
        let (api, _store, boot) = setup(true).await;
        let mut session = boot.bootstrap(None, "UTC").await.unwrap();

        boot.complete_setup(&mut session, vec!["Fantasy".into()], vec!["a1".into()])
            .await
            .unwrap();
        assert!(!session.needs_setup);
        assert_eq!(session.user.favorite_genres, vec!["Fantasy".to_string()]);
        assert_eq!(
            api.calls().last(),
            Some(&Call::UpdateFavorites {
                genres: vec!["Fantasy".into()],
                authors: vec!["a1".into()],
            })
        );
    }

    #[tokio::test]
    async fn failed_setup_keeps_flag() {
        let (api, _store, boot) = setup(true).await;
        let mut session = boot.bootstrap(None, "UTC").await.unwrap();
        api.fail("update_favorites");
        assert!(boot.complete_setup(&mut session, Vec::new(), Vec::new()).await.is_err());
        assert!(session.needs_setup);
    }
}
