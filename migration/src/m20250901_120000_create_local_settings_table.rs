use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LocalSettings::Table)
                    .if_not_exists()
                    .col(string(LocalSettings::Key).primary_key())
                    .col(text(LocalSettings::Value))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LocalSettings::Table).to_owned())
            .await?;

        Ok(())
    }
}

/// Device-resident key/value settings (device id, user id, avatar).
#[derive(DeriveIden)]
pub enum LocalSettings {
    Table,
    Key,
    Value,
}
