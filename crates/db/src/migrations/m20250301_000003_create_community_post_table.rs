//! Create community post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CommunityPost::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommunityPost::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommunityPost::CommunityId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunityPost::AuthorId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommunityPost::Content).text().not_null())
                    .col(
                        ColumnDef::new(CommunityPost::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_community_post_community")
                            .from(CommunityPost::Table, CommunityPost::CommunityId)
                            .to(Community::Table, Community::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_community_post_author")
                            .from(CommunityPost::Table, CommunityPost::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: community_id + created_at (community timelines)
        manager
            .create_index(
                Index::create()
                    .name("idx_community_post_community_created")
                    .table(CommunityPost::Table)
                    .col(CommunityPost::CommunityId)
                    .col(CommunityPost::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: author_id + created_at (activity feed source)
        manager
            .create_index(
                Index::create()
                    .name("idx_community_post_author_created")
                    .table(CommunityPost::Table)
                    .col(CommunityPost::AuthorId)
                    .col(CommunityPost::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommunityPost::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CommunityPost {
    Table,
    Id,
    CommunityId,
    AuthorId,
    Content,
    CreatedAt,
}

#[derive(Iden)]
enum Community {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
