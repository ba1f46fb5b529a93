use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserActionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserActionLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserActionLogs::UserId).uuid())
                    .col(ColumnDef::new(UserActionLogs::Action).string().not_null())
                    .col(ColumnDef::new(UserActionLogs::Status).string().not_null())
                    .col(
                        ColumnDef::new(UserActionLogs::Details)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserActionLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(UserActionLogs::Table)
                    .col(UserActionLogs::Action)
                    .col(UserActionLogs::CreatedAt)
                    .name("idx_user_action_logs_action_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserActionLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserActionLogs {
    Table,
    Id,
    UserId,
    Action,
    Status,
    Details,
    CreatedAt,
}
