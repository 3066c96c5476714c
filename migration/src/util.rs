use sea_orm_migration::prelude::*;

pub(crate) fn default_table_statement() -> TableCreateStatement {
    TableCreateStatement::new()
        .if_not_exists()
        .col(ColumnDef::new(DefaultColumn::Id)
            .uuid()
            .primary_key()
            .default(Expr::cust("GEN_RANDOM_UUID()"))
            .take())
        .col(ColumnDef::new(DefaultColumn::CreatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .take())
        .col(ColumnDef::new(DefaultColumn::UpdatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .take())
        .take()
}

#[derive(DeriveIden)]
pub(crate) enum DefaultColumn {
    Id,
    CreatedAt,
    UpdatedAt,
}

/// Every table owned by a school carries its tenant
pub(crate) fn default_tenant_table_statement() -> TableCreateStatement {
    default_table_statement()
        .col(ColumnDef::new(DefaultTenantColumn::TenantId)
            .uuid()
            .not_null())
        .take()
}

#[derive(DeriveIden)]
pub(crate) enum DefaultTenantColumn {
    TenantId,
}

/// Money columns, two decimal places
pub(crate) fn money(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .decimal_len(14, 2)
        .not_null()
        .take()
}

/// Points `$c` of table `$t` at `user.id`
///
/// # Example
///
/// ```rs
/// setup_user_fk!(manager, Payroll::Table, Payroll::EmployeeId);
/// ```
#[macro_export]
macro_rules! setup_user_fk {
    ($m:expr,$t:expr,$c:expr) => {{
        use crate::util::*;
        use crate::m20250701_000001_init::User;

        $m.create_foreign_key(ForeignKeyCreateStatement::new()
                .from($t, $c)
                .to(User::Table, DefaultColumn::Id)
                .on_delete(ForeignKeyAction::Restrict)
                .on_update(ForeignKeyAction::Cascade)
                .take()
        ).await?;
    }};
}
