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
                    .table(Departments::Table)
                    .col(pk_id_col(manager, Departments::Id))
                    .col(uuid_col(Departments::Uuid))
                    .col(ColumnDef::new(Departments::Name).string().not_null())
                    .col(timestamp_col(Departments::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Managements::Table)
                    .col(pk_id_col(manager, Managements::Id))
                    .col(uuid_col(Managements::Uuid))
                    .col(fk_id_col(manager, Managements::DepartmentId))
                    .col(ColumnDef::new(Managements::Name).string().not_null())
                    .col(timestamp_col(Managements::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_managements_department_id")
                            .from(Managements::Table, Managements::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Divisions::Table)
                    .col(pk_id_col(manager, Divisions::Id))
                    .col(uuid_col(Divisions::Uuid))
                    .col(fk_id_col(manager, Divisions::DepartmentId))
                    .col(fk_id_nullable_col(manager, Divisions::ManagementId))
                    .col(ColumnDef::new(Divisions::Name).string().not_null())
                    .col(timestamp_col(Divisions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_divisions_department_id")
                            .from(Divisions::Table, Divisions::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_divisions_management_id")
                            .from(Divisions::Table, Divisions::ManagementId)
                            .to(Managements::Table, Managements::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Users::Table)
                    .col(pk_id_col(manager, Users::Id))
                    .col(uuid_col(Users::Uuid))
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("employee")),
                    )
                    .col(fk_id_nullable_col(manager, Users::DepartmentId))
                    .col(fk_id_nullable_col(manager, Users::ManagementId))
                    .col(fk_id_nullable_col(manager, Users::DivisionId))
                    .col(ColumnDef::new(Users::Grade).string_len(1))
                    .col(
                        ColumnDef::new(Users::Rating)
                            .double()
                            .not_null()
                            .default(Expr::val(0.0)),
                    )
                    .col(timestamp_col(Users::CreatedAt))
                    .col(timestamp_col(Users::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_department_id")
                            .from(Users::Table, Users::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_management_id")
                            .from(Users::Table, Users::ManagementId)
                            .to(Managements::Table, Managements::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_division_id")
                            .from(Users::Table, Users::DivisionId)
                            .to(Divisions::Table, Divisions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(PointTransactions::Table)
                    .col(pk_id_col(manager, PointTransactions::Id))
                    .col(uuid_col(PointTransactions::Uuid))
                    .col(fk_id_col(manager, PointTransactions::UserId))
                    .col(
                        ColumnDef::new(PointTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::TransactionType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PointTransactions::TaskTitle).string())
                    .col(ColumnDef::new(PointTransactions::Comment).text())
                    .col(timestamp_col(PointTransactions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_point_transactions_user_id")
                            .from(PointTransactions::Table, PointTransactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_departments_uuid")
                    .table(Departments::Table)
                    .col(Departments::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_managements_uuid")
                    .table(Managements::Table)
                    .col(Managements::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_divisions_uuid")
                    .table(Divisions::Table)
                    .col(Divisions::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_uuid")
                    .table(Users::Table)
                    .col(Users::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_point_transactions_uuid")
                    .table(PointTransactions::Table)
                    .col(PointTransactions::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_point_transactions_user_id")
                    .table(PointTransactions::Table)
                    .col(PointTransactions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PointTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Divisions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Managements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Departments::Table).to_owned())
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
    Uuid,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Managements {
    Table,
    Id,
    Uuid,
    DepartmentId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Divisions {
    Table,
    Id,
    Uuid,
    DepartmentId,
    ManagementId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Uuid,
    Name,
    Role,
    DepartmentId,
    ManagementId,
    DivisionId,
    Grade,
    Rating,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PointTransactions {
    Table,
    Id,
    Uuid,
    UserId,
    Amount,
    TransactionType,
    TaskTitle,
    Comment,
    CreatedAt,
}
