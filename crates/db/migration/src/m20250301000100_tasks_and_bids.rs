use sea_orm_migration::{prelude::*, sea_orm::DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Tasks::Table)
                    .col(pk_id_col(manager, Tasks::Id))
                    .col(uuid_col(Tasks::Uuid))
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(ColumnDef::new(Tasks::Description).text())
                    .col(
                        ColumnDef::new(Tasks::TaskType)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("individual")),
                    )
                    .col(
                        ColumnDef::new(Tasks::Mode)
                            .string_len(16)
                            .not_null()
                            .default(Expr::val("money")),
                    )
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("backlog")),
                    )
                    .col(fk_id_col(manager, Tasks::DepartmentId))
                    .col(fk_id_nullable_col(manager, Tasks::ManagementId))
                    .col(fk_id_nullable_col(manager, Tasks::DivisionId))
                    .col(fk_id_col(manager, Tasks::CreatorId))
                    .col(fk_id_nullable_col(manager, Tasks::AssigneeId))
                    .col(
                        ColumnDef::new(Tasks::MinimumGrade)
                            .string_len(1)
                            .not_null()
                            .default(Expr::val("D")),
                    )
                    .col(ColumnDef::new(Tasks::Deadline).timestamp())
                    .col(ColumnDef::new(Tasks::BasePrice).big_integer())
                    .col(ColumnDef::new(Tasks::BaseTimeMinutes).big_integer())
                    .col(ColumnDef::new(Tasks::CurrentPrice).big_integer())
                    .col(ColumnDef::new(Tasks::CurrentTimeMinutes).big_integer())
                    .col(ColumnDef::new(Tasks::AuctionStartAt).timestamp())
                    .col(ColumnDef::new(Tasks::AuctionPlannedEndAt).timestamp())
                    .col(ColumnDef::new(Tasks::AuctionEndAt).timestamp())
                    .col(ColumnDef::new(Tasks::AuctionExtendedAt).timestamp())
                    .col(
                        ColumnDef::new(Tasks::AuctionExtensionCount)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(
                        ColumnDef::new(Tasks::AuctionHasBids)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .col(fk_id_nullable_col(manager, Tasks::AuctionLeaderId))
                    .col(ColumnDef::new(Tasks::AuctionLeaderName).string())
                    .col(fk_id_nullable_col(manager, Tasks::AuctionWinnerId))
                    .col(ColumnDef::new(Tasks::AuctionWinnerName).string())
                    .col(
                        ColumnDef::new(Tasks::Version)
                            .big_integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(timestamp_col(Tasks::CreatedAt))
                    .col(timestamp_col(Tasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_department_id")
                            .from(Tasks::Table, Tasks::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_creator_id")
                            .from(Tasks::Table, Tasks::CreatorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tasks_uuid")
                    .table(Tasks::Table)
                    .col(Tasks::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // The sweep scans open auctions by (status, auction_end_at).
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tasks_status_auction_end_at")
                    .table(Tasks::Table)
                    .col(Tasks::Status)
                    .col(Tasks::AuctionEndAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(AuctionBids::Table)
                    .col(pk_id_col(manager, AuctionBids::Id))
                    .col(uuid_col(AuctionBids::Uuid))
                    .col(fk_id_col(manager, AuctionBids::TaskId))
                    .col(fk_id_col(manager, AuctionBids::BidderId))
                    .col(ColumnDef::new(AuctionBids::BidderName).string().not_null())
                    .col(
                        ColumnDef::new(AuctionBids::BidderGrade)
                            .string_len(1)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuctionBids::BidderRating)
                            .double()
                            .not_null()
                            .default(Expr::val(0.0)),
                    )
                    .col(
                        ColumnDef::new(AuctionBids::BidderPoints)
                            .big_integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(ColumnDef::new(AuctionBids::ValueMoney).big_integer())
                    .col(ColumnDef::new(AuctionBids::ValueTimeMinutes).big_integer())
                    .col(timestamp_col(AuctionBids::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auction_bids_task_id")
                            .from(AuctionBids::Table, AuctionBids::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auction_bids_bidder_id")
                            .from(AuctionBids::Table, AuctionBids::BidderId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_auction_bids_uuid")
                    .table(AuctionBids::Table)
                    .col(AuctionBids::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_auction_bids_task_id_created_at")
                    .table(AuctionBids::Table)
                    .col(AuctionBids::TaskId)
                    .col(AuctionBids::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuctionBids::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn fk_id_nullable_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Departments {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    Uuid,
    Title,
    Description,
    TaskType,
    Mode,
    Status,
    DepartmentId,
    ManagementId,
    DivisionId,
    CreatorId,
    AssigneeId,
    MinimumGrade,
    Deadline,
    BasePrice,
    BaseTimeMinutes,
    CurrentPrice,
    CurrentTimeMinutes,
    AuctionStartAt,
    AuctionPlannedEndAt,
    AuctionEndAt,
    AuctionExtendedAt,
    AuctionExtensionCount,
    AuctionHasBids,
    AuctionLeaderId,
    AuctionLeaderName,
    AuctionWinnerId,
    AuctionWinnerName,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AuctionBids {
    Table,
    Id,
    Uuid,
    TaskId,
    BidderId,
    BidderName,
    BidderGrade,
    BidderRating,
    BidderPoints,
    ValueMoney,
    ValueTimeMinutes,
    CreatedAt,
}
