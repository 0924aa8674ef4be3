use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 contents 表
        manager
            .create_table(
                Table::create()
                    .table(Content::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Content::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Content::Title).string().not_null())
                    .col(ColumnDef::new(Content::Description).text().null())
                    .col(ColumnDef::new(Content::ContentType).string().not_null())
                    .col(ColumnDef::new(Content::ReleaseYear).integer().null())
                    .col(ColumnDef::new(Content::Rating).double().null())
                    .col(ColumnDef::new(Content::Genre).string().null())
                    .col(ColumnDef::new(Content::Country).string().null())
                    .col(ColumnDef::new(Content::PosterUrl).text().null())
                    .col(ColumnDef::new(Content::BackdropUrl).text().null())
                    .col(ColumnDef::new(Content::DurationMinutes).integer().null())
                    .col(
                        ColumnDef::new(Content::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Content::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Content::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contents_type_created")
                    .table(Content::Table)
                    .col(Content::ContentType)
                    .col(Content::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contents_title")
                    .table(Content::Table)
                    .col(Content::Title)
                    .to_owned(),
            )
            .await?;

        // 创建 episodes 表
        manager
            .create_table(
                Table::create()
                    .table(Episode::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Episode::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Episode::ContentId).integer().not_null())
                    .col(
                        ColumnDef::new(Episode::SeasonNumber)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Episode::EpisodeNumber).integer().not_null())
                    .col(ColumnDef::new(Episode::Title).string().null())
                    .col(
                        ColumnDef::new(Episode::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_episodes_content")
                    .table(Episode::Table)
                    .col(Episode::ContentId)
                    .col(Episode::SeasonNumber)
                    .col(Episode::EpisodeNumber)
                    .to_owned(),
            )
            .await?;

        // 创建 download_links 表
        manager
            .create_table(
                Table::create()
                    .table(DownloadLink::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DownloadLink::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DownloadLink::ContentId).integer().not_null())
                    .col(ColumnDef::new(DownloadLink::EpisodeId).integer().null())
                    .col(ColumnDef::new(DownloadLink::Quality).string().not_null())
                    .col(ColumnDef::new(DownloadLink::FileSize).string().null())
                    .col(
                        ColumnDef::new(DownloadLink::SourceType)
                            .string()
                            .not_null()
                            .default("direct"),
                    )
                    .col(ColumnDef::new(DownloadLink::Url).text().not_null())
                    .col(
                        ColumnDef::new(DownloadLink::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_download_links_content")
                    .table(DownloadLink::Table)
                    .col(DownloadLink::ContentId)
                    .to_owned(),
            )
            .await?;

        // 创建 download_mirrors 表
        manager
            .create_table(
                Table::create()
                    .table(DownloadMirror::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DownloadMirror::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DownloadMirror::DownloadLinkId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DownloadMirror::Name).string().not_null())
                    .col(ColumnDef::new(DownloadMirror::Url).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_download_mirrors_link")
                    .table(DownloadMirror::Table)
                    .col(DownloadMirror::DownloadLinkId)
                    .to_owned(),
            )
            .await?;

        // 创建 trailers 表
        manager
            .create_table(
                Table::create()
                    .table(Trailer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Trailer::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Trailer::ContentId).integer().not_null())
                    .col(ColumnDef::new(Trailer::Title).string().null())
                    .col(ColumnDef::new(Trailer::Url).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_trailers_content")
                    .table(Trailer::Table)
                    .col(Trailer::ContentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trailer::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DownloadMirror::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DownloadLink::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Episode::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Content::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Content {
    #[sea_orm(iden = "contents")]
    Table,
    Id,
    Title,
    Description,
    ContentType,
    ReleaseYear,
    Rating,
    Genre,
    Country,
    PosterUrl,
    BackdropUrl,
    DurationMinutes,
    IsFeatured,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Episode {
    #[sea_orm(iden = "episodes")]
    Table,
    Id,
    ContentId,
    SeasonNumber,
    EpisodeNumber,
    Title,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DownloadLink {
    #[sea_orm(iden = "download_links")]
    Table,
    Id,
    ContentId,
    EpisodeId,
    Quality,
    FileSize,
    SourceType,
    Url,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DownloadMirror {
    #[sea_orm(iden = "download_mirrors")]
    Table,
    Id,
    DownloadLinkId,
    Name,
    Url,
}

#[derive(DeriveIden)]
enum Trailer {
    #[sea_orm(iden = "trailers")]
    Table,
    Id,
    ContentId,
    Title,
    Url,
}
