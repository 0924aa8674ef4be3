use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ads 表同时承载展示广告和 redirect_link 配置
        manager
            .create_table(
                Table::create()
                    .table(Ad::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Ad::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Ad::Name).string().not_null())
                    .col(ColumnDef::new(Ad::AdType).string().not_null())
                    .col(ColumnDef::new(Ad::Position).string().not_null())
                    .col(ColumnDef::new(Ad::ImageUrl).text().null())
                    .col(ColumnDef::new(Ad::HtmlCode).text().null())
                    .col(ColumnDef::new(Ad::RedirectUrl).text().null())
                    .col(
                        ColumnDef::new(Ad::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Ad::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Ad::CreatedAt)
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
                    .name("idx_ads_type_position")
                    .table(Ad::Table)
                    .col(Ad::AdType)
                    .col(Ad::Position)
                    .col(Ad::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genre::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Genre::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Genre::Name).string().not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Country::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Country::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Country::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Country::Code).string().null())
                    .to_owned(),
            )
            .await?;

        // 站点设置（原 contentDisplaySettings / headerConfig）
        manager
            .create_table(
                Table::create()
                    .table(SiteSetting::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SiteSetting::Key)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SiteSetting::Value).text().not_null())
                    .col(
                        ColumnDef::new(SiteSetting::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SiteSetting::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Country::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Genre::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ad::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Ad {
    #[sea_orm(iden = "ads")]
    Table,
    Id,
    Name,
    AdType,
    Position,
    ImageUrl,
    HtmlCode,
    RedirectUrl,
    IsActive,
    DisplayOrder,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Genre {
    #[sea_orm(iden = "genres")]
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Country {
    #[sea_orm(iden = "countries")]
    Table,
    Id,
    Name,
    Code,
}

#[derive(DeriveIden)]
enum SiteSetting {
    #[sea_orm(iden = "site_settings")]
    Table,
    Key,
    Value,
    UpdatedAt,
}
