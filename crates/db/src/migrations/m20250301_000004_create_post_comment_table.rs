//! Create post comment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostComment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostComment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PostComment::PostId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PostComment::AuthorId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PostComment::Text).text().not_null())
                    .col(
                        ColumnDef::new(PostComment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_comment_post")
                            .from(PostComment::Table, PostComment::PostId)
                            .to(CommunityPost::Table, CommunityPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_comment_author")
                            .from(PostComment::Table, PostComment::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: post_id (listing comments on a post)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_comment_post_id")
                    .table(PostComment::Table)
                    .col(PostComment::PostId)
                    .to_owned(),
            )
            .await?;

        // Index: author_id + created_at (activity feed source)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_comment_author_created")
                    .table(PostComment::Table)
                    .col(PostComment::AuthorId)
                    .col(PostComment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostComment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PostComment {
    Table,
    Id,
    PostId,
    AuthorId,
    Text,
    CreatedAt,
}

#[derive(Iden)]
enum CommunityPost {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
