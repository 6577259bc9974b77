use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailHistories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailHistories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailHistories::UserId).uuid().not_null())
                    .col(ColumnDef::new(EmailHistories::Kind).string_len(16).not_null())
                    .col(
                        ColumnDef::new(EmailHistories::RecipientEmail)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailHistories::RecipientName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(EmailHistories::Subject).string().not_null())
                    .col(ColumnDef::new(EmailHistories::Body).text().not_null())
                    .col(ColumnDef::new(EmailHistories::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(EmailHistories::ErrorMessage)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(EmailHistories::BatchId)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(EmailHistories::SentAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailHistories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EmailHistories::Table, EmailHistories::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(EmailHistories::Table)
                    .col(EmailHistories::UserId)
                    .col(EmailHistories::SentAt)
                    .name("idx_email_histories_user_id_sent_at")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(EmailHistories::Table)
                    .col(EmailHistories::BatchId)
                    .name("idx_email_histories_batch_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailHistories::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EmailHistories {
    Table,
    Id,
    UserId,
    Kind,
    RecipientEmail,
    RecipientName,
    Subject,
    Body,
    Status,
    ErrorMessage,
    BatchId,
    SentAt,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
