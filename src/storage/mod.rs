// Device-resident key/value settings; sqlite through sea-orm

use anyhow::Context;
use entities::local_setting;
use migration::MigratorTrait;
use sea_orm::{
    ActiveValue::Set, Database, DatabaseConnection, EntityTrait, sea_query::OnConflict,
};

pub const DEVICE_ID_KEY: &str = "userDeviceId";
pub const USER_ID_KEY: &str = "userId";
pub const AVATAR_KEY: &str = "avatar";

#[async_trait::async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    async fn device_id(&self) -> anyhow::Result<Option<String>> {
        self.get(DEVICE_ID_KEY).await
    }

    async fn set_device_id(&self, device_id: &str) -> anyhow::Result<()> {
        self.set(DEVICE_ID_KEY, device_id).await
    }

    async fn user_id(&self) -> anyhow::Result<Option<String>> {
        self.get(USER_ID_KEY).await
    }

    async fn set_user_id(&self, user_id: &str) -> anyhow::Result<()> {
        self.set(USER_ID_KEY, user_id).await
    }

    async fn avatar(&self) -> anyhow::Result<Option<String>> {
        self.get(AVATAR_KEY).await
    }

    async fn set_avatar(&self, avatar: &str) -> anyhow::Result<()> {
        self.set(AVATAR_KEY, avatar).await
    }
}

#[derive(Clone, Debug)]
pub struct SqliteLocalStore {
    db: DatabaseConnection,
}

impl SqliteLocalStore {
    /// Connect and bring the schema up to date.
    pub async fn connect(connection_string: &str) -> anyhow::Result<Self> {
        let db = Database::connect(connection_string)
            .await
            .with_context(|| "Failed to connect to local database")?;
        migration::Migrator::up(&db, None)
            .await
            .with_context(|| "Failed to run local database migrations")?;
        tracing::debug!("local store ready");
        Ok(Self { db })
    }
}

#[async_trait::async_trait]
impl LocalStore for SqliteLocalStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = local_setting::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await?;
        Ok(row.map(|m| m.value))
    }

    #[tracing::instrument(level = "debug", skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let row = local_setting::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
        };
        local_setting::Entity::insert(row)
            .on_conflict(
                OnConflict::column(local_setting::Column::Key)
                    .update_column(local_setting::Column::Value)
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
