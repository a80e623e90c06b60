//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250301_000001_create_user_table;
mod m20250301_000002_create_community_table;
mod m20250301_000003_create_community_post_table;
mod m20250301_000004_create_post_comment_table;
mod m20250301_000005_create_post_like_table;
mod m20250301_000006_create_community_block_table;
mod m20250301_000007_create_content_item_table;
mod m20250301_000008_create_rating_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_user_table::Migration),
            Box::new(m20250301_000002_create_community_table::Migration),
            Box::new(m20250301_000003_create_community_post_table::Migration),
            Box::new(m20250301_000004_create_post_comment_table::Migration),
            Box::new(m20250301_000005_create_post_like_table::Migration),
            Box::new(m20250301_000006_create_community_block_table::Migration),
            Box::new(m20250301_000007_create_content_item_table::Migration),
            Box::new(m20250301_000008_create_rating_table::Migration),
        ]
    }
}
