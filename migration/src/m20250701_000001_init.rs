use sea_orm_migration::{prelude::{extension::postgres::TypeDropStatement, *}, sea_orm::{ActiveEnum, DbBackend, DeriveActiveEnum, EnumIter, Schema}};

use crate::{setup_user_fk, util::{default_tenant_table_statement, money, DefaultColumn}};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(DbBackend::Postgres);

        manager.create_type(schema.create_enum_from_active_enum::<RoleType>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<ApprovalStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<DeductionStatus>()).await?;
        manager.create_type(schema.create_enum_from_active_enum::<PaymentStatus>()).await?;

        manager
            .create_table(default_tenant_table_statement()
                .table(User::Table)
                .col(ColumnDef::new(User::Username)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(User::FullName)
                    .text()
                    .not_null())
                .col(ColumnDef::new(User::EmployeeCode)
                    .text())
                .col(ColumnDef::new(User::Role)
                    .custom(RoleType::name())
                    .not_null())
                .col(ColumnDef::new(User::Salary)
                    .decimal_len(14, 2)) // Only staff on the payroll have one
                .col(ColumnDef::new(User::IsActive)
                    .boolean()
                    .not_null()
                    .default(true))
                .take()
            ).await?;

        manager
            .create_table(default_tenant_table_statement()
                .table(AdvanceSalary::Table)
                .col(ColumnDef::new(AdvanceSalary::EmployeeId)
                    .uuid()
                    .not_null())
                .col(money(AdvanceSalary::AmountRequested)
                    .check(Expr::col(AdvanceSalary::AmountRequested).gt(0))
                    .take())
                .col(ColumnDef::new(AdvanceSalary::Reason)
                    .text())
                .col(ColumnDef::new(AdvanceSalary::ApprovalStatus)
                    .custom(ApprovalStatus::name())
                    .not_null()
                    .default(Expr::val("pending").cast_as(ApprovalStatus::name())))
                .col(ColumnDef::new(AdvanceSalary::DeductionStatus)
                    .custom(DeductionStatus::name())
                    .not_null()
                    .default(Expr::val("pending").cast_as(DeductionStatus::name())))
                .col(money(AdvanceSalary::AmountDeducted)
                    .default(0)
                    .take())
                .col(money(AdvanceSalary::RemainingAmount)
                    .check(Expr::col(AdvanceSalary::RemainingAmount).gte(0))
                    .take())
                .col(ColumnDef::new(AdvanceSalary::RequestDate)
                    .timestamp_with_time_zone()
                    .not_null())
                .col(ColumnDef::new(AdvanceSalary::ApprovedBy)
                    .uuid())
                .take()
            ).await?;
        setup_user_fk!(manager, AdvanceSalary::Table, AdvanceSalary::EmployeeId);

        manager
            .create_table(default_tenant_table_statement()
                .table(Payroll::Table)
                .col(ColumnDef::new(Payroll::EmployeeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Payroll::Month)
                    .small_integer()
                    .not_null()
                    .check(Expr::col(Payroll::Month).between(1, 12)))
                .col(ColumnDef::new(Payroll::Year)
                    .integer()
                    .not_null())
                .col(money(Payroll::BaseSalary))
                .col(money(Payroll::Bonuses).default(0).take())
                .col(money(Payroll::OtherDeductions).default(0).take())
                .col(money(Payroll::TotalAdvanceDeduction).default(0).take())
                .col(money(Payroll::NetSalary)
                    .check(Expr::col(Payroll::NetSalary).gte(0))
                    .take())
                .col(ColumnDef::new(Payroll::PaymentStatus)
                    .custom(PaymentStatus::name())
                    .not_null()
                    .default(Expr::val("pending").cast_as(PaymentStatus::name())))
                .col(ColumnDef::new(Payroll::PaymentDate)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(Payroll::PaymentMethod)
                    .text())
                .col(ColumnDef::new(Payroll::Remarks)
                    .text())
                .col(ColumnDef::new(Payroll::IsDeleted)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(Payroll::DeletedAt)
                    .timestamp_with_time_zone())
                .col(ColumnDef::new(Payroll::DeletedBy)
                    .uuid())
                .col(ColumnDef::new(Payroll::GeneratedBy)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Payroll::UpdatedBy)
                    .uuid())
                .col(ColumnDef::new(Payroll::GeneratedAt)
                    .timestamp_with_time_zone()
                    .not_null())
                .take()
            ).await?;
        setup_user_fk!(manager, Payroll::Table, Payroll::EmployeeId);

        // Deleted records must not block regeneration, which a plain unique index would
        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE UNIQUE INDEX IF NOT EXISTS "payroll_tenant_employee_period_key"
                ON "payroll" ("tenant_id", "employee_id", "month", "year")
                WHERE "is_deleted" = false"#
            ).await?;

        manager
            .create_table(default_tenant_table_statement()
                .table(AdvanceDeduction::Table)
                .col(ColumnDef::new(AdvanceDeduction::AdvanceSalaryId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(AdvanceDeduction::PayrollId)
                    .uuid()
                    .not_null())
                .col(money(AdvanceDeduction::Amount)
                    .check(Expr::col(AdvanceDeduction::Amount).gt(0))
                    .take())
                .col(ColumnDef::new(AdvanceDeduction::Month)
                    .small_integer()
                    .not_null())
                .col(ColumnDef::new(AdvanceDeduction::Year)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(AdvanceDeduction::AppliedAt)
                    .timestamp_with_time_zone()
                    .not_null())
                .col(ColumnDef::new(AdvanceDeduction::ReversedAt)
                    .timestamp_with_time_zone())
                .take()
            ).await?;

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(AdvanceDeduction::Table, AdvanceDeduction::AdvanceSalaryId)
            .to(AdvanceSalary::Table, DefaultColumn::Id)
            .on_delete(ForeignKeyAction::Restrict)
            .take()
        ).await?;

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(AdvanceDeduction::Table, AdvanceDeduction::PayrollId)
            .to(Payroll::Table, DefaultColumn::Id)
            .on_delete(ForeignKeyAction::Restrict)
            .take()
        ).await?;

        manager.create_index(IndexCreateStatement::new()
            .name("advance_salary_open_idx")
            .table(AdvanceSalary::Table)
            .col(AdvanceSalary::EmployeeId)
            .col(AdvanceSalary::DeductionStatus)
            .col(AdvanceSalary::RequestDate)
            .take()
        ).await?;

        manager.create_index(IndexCreateStatement::new()
            .name("advance_deduction_payroll_idx")
            .table(AdvanceDeduction::Table)
            .col(AdvanceDeduction::PayrollId)
            .take()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            AdvanceDeduction::Table.into_iden(),
            Payroll::Table.into_iden(),
            AdvanceSalary::Table.into_iden(),
            User::Table.into_iden(),
        ] {
            manager.drop_table(
                TableDropStatement::new()
                    .table(table)
                    .take()
            ).await?;
        }

        for name in [
            PaymentStatus::name(),
            DeductionStatus::name(),
            ApprovalStatus::name(),
            RoleType::name(),
        ] {
            manager
                .drop_type(
                    TypeDropStatement::new()
                        .name(name)
                        .to_owned()
                ).await?;
        }

        Ok(())
    }
}

#[derive(Iden)]
pub(crate) enum User {
    Table,
    Username,
    FullName,
    EmployeeCode,
    Role,
    Salary,
    IsActive,
}

#[derive(Iden)]
enum AdvanceSalary {
    Table,
    EmployeeId,
    AmountRequested,
    Reason,
    ApprovalStatus,
    DeductionStatus,
    AmountDeducted,
    RemainingAmount,
    RequestDate,
    ApprovedBy,
}

#[derive(Iden)]
enum Payroll {
    Table,
    EmployeeId,
    Month,
    Year,
    BaseSalary,
    Bonuses,
    OtherDeductions,
    TotalAdvanceDeduction,
    NetSalary,
    PaymentStatus,
    PaymentDate,
    PaymentMethod,
    Remarks,
    IsDeleted,
    DeletedAt,
    DeletedBy,
    GeneratedBy,
    UpdatedBy,
    GeneratedAt,
}

#[derive(Iden)]
enum AdvanceDeduction {
    Table,
    AdvanceSalaryId,
    PayrollId,
    Amount,
    Month,
    Year,
    AppliedAt,
    ReversedAt,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_type")]
enum RoleType {
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "teacher")]
    Teacher,
    #[sea_orm(string_value = "staff")]
    Staff,
    #[sea_orm(string_value = "accountant")]
    Accountant,
    #[sea_orm(string_value = "librarian")]
    Librarian,
    #[sea_orm(string_value = "student")]
    Student,
    #[sea_orm(string_value = "parent")]
    Parent,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "approval_status")]
enum ApprovalStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "deduction_status")]
enum DeductionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "complete")]
    Complete,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}
