use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(254)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(timestamp(Users::CreatedAt))
                    .col(timestamp(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Authors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Authors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Authors::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Authors::Email)
                            .string_len(254)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Authors::UserId).uuid().null())
                    .col(timestamp(Authors::CreatedAt))
                    .col(timestamp(Authors::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("authors_user_id_fkey")
                            .from(Authors::Table, Authors::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Posts::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(Posts::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Posts::Content).text().not_null())
                    .col(timestamp(Posts::PublishedDate))
                    .col(
                        ColumnDef::new(Posts::Status)
                            .string_len(10)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Posts::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(timestamp(Posts::CreatedAt))
                    .col(timestamp(Posts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("posts_author_id_fkey")
                            .from(Posts::Table, Posts::AuthorId)
                            .to(Authors::Table, Authors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Comments::PostId).uuid().not_null())
                    .col(ColumnDef::new(Comments::UserId).uuid().not_null())
                    .col(ColumnDef::new(Comments::Content).text().not_null())
                    .col(timestamp(Comments::Created))
                    .col(
                        ColumnDef::new(Comments::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("comments_post_id_fkey")
                            .from(Comments::Table, Comments::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("comments_user_id_fkey")
                            .from(Comments::Table, Comments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for index in secondary_indexes() {
            manager.create_index(index).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Authors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

fn timestamp<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

/// Lookup paths used by listing, ownership checks and comment moderation.
fn secondary_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_authors_user_id")
            .table(Authors::Table)
            .col(Authors::UserId)
            .to_owned(),
        Index::create()
            .name("idx_posts_author_id")
            .table(Posts::Table)
            .col(Posts::AuthorId)
            .to_owned(),
        Index::create()
            .name("idx_posts_status")
            .table(Posts::Table)
            .col(Posts::Status)
            .to_owned(),
        Index::create()
            .name("idx_posts_active")
            .table(Posts::Table)
            .col(Posts::Active)
            .to_owned(),
        Index::create()
            .name("idx_posts_published_date")
            .table(Posts::Table)
            .col(Posts::PublishedDate)
            .to_owned(),
        Index::create()
            .name("idx_posts_status_active")
            .table(Posts::Table)
            .col(Posts::Status)
            .col(Posts::Active)
            .to_owned(),
        Index::create()
            .name("idx_comments_post_id")
            .table(Comments::Table)
            .col(Comments::PostId)
            .to_owned(),
        Index::create()
            .name("idx_comments_user_id")
            .table(Comments::Table)
            .col(Comments::UserId)
            .to_owned(),
        Index::create()
            .name("idx_comments_created")
            .table(Comments::Table)
            .col(Comments::Created)
            .to_owned(),
        Index::create()
            .name("idx_comments_is_approved")
            .table(Comments::Table)
            .col(Comments::IsApproved)
            .to_owned(),
        Index::create()
            .name("idx_comments_post_id_is_approved")
            .table(Comments::Table)
            .col(Comments::PostId)
            .col(Comments::IsApproved)
            .to_owned(),
    ]
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Authors {
    Table,
    Id,
    Name,
    Email,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    AuthorId,
    Title,
    Content,
    PublishedDate,
    Status,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    PostId,
    UserId,
    Content,
    Created,
    IsApproved,
}
