//! Create community block table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CommunityBlock::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommunityBlock::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommunityBlock::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunityBlock::CommunityId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommunityBlock::Reason).string_len(255))
                    .col(
                        ColumnDef::new(CommunityBlock::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_community_block_user")
                            .from(CommunityBlock::Table, CommunityBlock::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_community_block_community")
                            .from(CommunityBlock::Table, CommunityBlock::CommunityId)
                            .to(Community::Table, Community::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, community_id) - prevent duplicate blocks
        manager
            .create_index(
                Index::create()
                    .name("idx_community_block_user_community")
                    .table(CommunityBlock::Table)
                    .col(CommunityBlock::UserId)
                    .col(CommunityBlock::CommunityId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: community_id (cascade cleanup on community deletion)
        manager
            .create_index(
                Index::create()
                    .name("idx_community_block_community_id")
                    .table(CommunityBlock::Table)
                    .col(CommunityBlock::CommunityId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommunityBlock::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CommunityBlock {
    Table,
    Id,
    UserId,
    CommunityId,
    Reason,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Community {
    Table,
    Id,
}
