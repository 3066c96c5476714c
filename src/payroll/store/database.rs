use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{prelude::DateTimeWithTimeZone, sea_query::Expr, ActiveValue::{Set, Unchanged}, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QueryTrait, TransactionTrait};
use tracing::debug;
use uuid::Uuid;

use crate::{consts::PAYROLL_ELIGIBLE_ROLES, entity::{advance_deduction, advance_salary, payroll, prelude::*, sea_orm_active_enums::{ApprovalStatus, DeductionStatus, PaymentStatus}, user}, payroll::{ledger::AdvanceUpdate, Period}};

use super::{Employee, EmployeeDirectory, Paginated, PaymentUpdate, PayrollFilter, PayrollRemoval, PayrollStore, PayrollWrite, StoreError};

#[async_trait]
impl EmployeeDirectory for DatabaseConnection {
    async fn find_eligible_employees(&self, tenant_id: Uuid) -> Result<Vec<Employee>, StoreError> {
        let users = User::find()
            .filter(user::Column::TenantId.eq(tenant_id))
            .filter(user::Column::IsActive.eq(true))
            .filter(user::Column::Role.is_in(PAYROLL_ELIGIBLE_ROLES))
            .filter(user::Column::Salary.gt(Decimal::ZERO))
            .order_by_asc(user::Column::FullName)
            .order_by_asc(user::Column::Id)
            .all(self).await?;

        Ok(users.into_iter().filter_map(Employee::from_user).collect())
    }
}

#[async_trait]
impl PayrollStore for DatabaseConnection {
    async fn find_payroll(&self, tenant_id: Uuid, employee_id: Uuid, period: Period) -> Result<Option<payroll::Model>, StoreError> {
        let record = Payroll::find()
            .filter(payroll::Column::TenantId.eq(tenant_id))
            .filter(payroll::Column::EmployeeId.eq(employee_id))
            .filter(payroll::Column::Month.eq(period.month()))
            .filter(payroll::Column::Year.eq(period.year()))
            .filter(payroll::Column::IsDeleted.eq(false))
            .one(self).await?;

        Ok(record)
    }

    async fn find_payroll_by_id(&self, tenant_id: Uuid, payroll_id: Uuid) -> Result<Option<payroll::Model>, StoreError> {
        let record = Payroll::find_by_id(payroll_id)
            .filter(payroll::Column::TenantId.eq(tenant_id))
            .one(self).await?;

        Ok(record)
    }

    async fn open_advances(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<Vec<advance_salary::Model>, StoreError> {
        let advances = AdvanceSalary::find()
            .filter(advance_salary::Column::TenantId.eq(tenant_id))
            .filter(advance_salary::Column::EmployeeId.eq(employee_id))
            .filter(advance_salary::Column::ApprovalStatus.eq(ApprovalStatus::Approved))
            .filter(advance_salary::Column::DeductionStatus.is_in([DeductionStatus::Pending, DeductionStatus::Partial]))
            .order_by_asc(advance_salary::Column::RequestDate)
            .order_by_asc(advance_salary::Column::CreatedAt)
            .order_by_asc(advance_salary::Column::Id)
            .all(self).await?;

        Ok(advances)
    }

    async fn find_advances(&self, tenant_id: Uuid, advance_ids: Vec<Uuid>) -> Result<Vec<advance_salary::Model>, StoreError> {
        if advance_ids.is_empty() {
            return Ok(Vec::new());
        }

        let advances = AdvanceSalary::find()
            .filter(advance_salary::Column::TenantId.eq(tenant_id))
            .filter(advance_salary::Column::Id.is_in(advance_ids))
            .all(self).await?;

        Ok(advances)
    }

    async fn find_advance(&self, tenant_id: Uuid, advance_id: Uuid) -> Result<Option<advance_salary::Model>, StoreError> {
        let advance = AdvanceSalary::find_by_id(advance_id)
            .filter(advance_salary::Column::TenantId.eq(tenant_id))
            .one(self).await?;

        Ok(advance)
    }

    async fn payroll_deductions(&self, tenant_id: Uuid, payroll_id: Uuid) -> Result<Vec<advance_deduction::Model>, StoreError> {
        let lines = AdvanceDeduction::find()
            .filter(advance_deduction::Column::TenantId.eq(tenant_id))
            .filter(advance_deduction::Column::PayrollId.eq(payroll_id))
            .filter(advance_deduction::Column::ReversedAt.is_null())
            .order_by_asc(advance_deduction::Column::AppliedAt)
            .order_by_asc(advance_deduction::Column::Id)
            .all(self).await?;

        Ok(lines)
    }

    async fn advance_deductions(&self, tenant_id: Uuid, advance_id: Uuid) -> Result<Vec<advance_deduction::Model>, StoreError> {
        let lines = AdvanceDeduction::find()
            .filter(advance_deduction::Column::TenantId.eq(tenant_id))
            .filter(advance_deduction::Column::AdvanceSalaryId.eq(advance_id))
            .order_by_asc(advance_deduction::Column::AppliedAt)
            .order_by_asc(advance_deduction::Column::Id)
            .all(self).await?;

        Ok(lines)
    }

    async fn save_payroll(&self, write: PayrollWrite) -> Result<payroll::Model, StoreError> {
        let txn = self.begin().await?;

        let record = match write.replaces {
            Some(payroll_id) => Payroll::update(payroll::ActiveModel {
                id: Unchanged(payroll_id),
                updated_at: Set(write.at),
                base_salary: Set(write.base_salary),
                bonuses: Set(write.bonuses),
                other_deductions: Set(write.other_deductions),
                total_advance_deduction: Set(write.total_advance_deduction),
                net_salary: Set(write.net_salary),
                updated_by: Set(Some(write.actor_id)),
                generated_at: Set(write.at),
                ..Default::default()
            })
                .filter(payroll::Column::IsDeleted.eq(false))
                .exec(&txn).await
                .map_err(|err| match err {
                    DbErr::RecordNotUpdated => StoreError::NotFound,
                    err => err.into(),
                })?,
            None => Payroll::insert(payroll::ActiveModel {
                id: Set(Uuid::new_v4()),
                created_at: Set(write.at),
                updated_at: Set(write.at),
                tenant_id: Set(write.tenant_id),
                employee_id: Set(write.employee_id),
                month: Set(write.period.month()),
                year: Set(write.period.year()),
                base_salary: Set(write.base_salary),
                bonuses: Set(write.bonuses),
                other_deductions: Set(write.other_deductions),
                total_advance_deduction: Set(write.total_advance_deduction),
                net_salary: Set(write.net_salary),
                payment_status: Set(PaymentStatus::Pending),
                payment_date: Set(None),
                payment_method: Set(None),
                remarks: Set(None),
                is_deleted: Set(false),
                deleted_at: Set(None),
                deleted_by: Set(None),
                generated_by: Set(write.actor_id),
                updated_by: Set(None),
                generated_at: Set(write.at),
            })
                .exec_with_returning(&txn).await?,
        };

        reverse_lines(&txn, &write.reversed_lines, write.at).await?;

        if !write.lines.is_empty() {
            AdvanceDeduction::insert_many(write.lines.iter().map(|line| advance_deduction::ActiveModel {
                id: Set(Uuid::new_v4()),
                created_at: Set(write.at),
                updated_at: Set(write.at),
                tenant_id: Set(write.tenant_id),
                advance_salary_id: Set(line.advance_salary_id),
                payroll_id: Set(record.id),
                amount: Set(line.amount),
                month: Set(write.period.month()),
                year: Set(write.period.year()),
                applied_at: Set(line.applied_at),
                reversed_at: Set(None),
            }))
                .exec(&txn).await?;
        }

        write_advances(&txn, &write.advances, write.at).await?;

        txn.commit().await?;

        debug!(payroll_id = %record.id, lines = write.lines.len(), advances = write.advances.len(), "payroll persisted");

        Ok(record)
    }

    async fn update_payment(&self, payroll_id: Uuid, update: PaymentUpdate, actor_id: Uuid, at: DateTimeWithTimeZone) -> Result<payroll::Model, StoreError> {
        let record = Payroll::update(payroll::ActiveModel {
            id: Unchanged(payroll_id),
            updated_at: Set(at),
            payment_status: Set(update.payment_status),
            payment_date: Set(update.payment_date),
            payment_method: Set(update.payment_method),
            remarks: Set(update.remarks),
            updated_by: Set(Some(actor_id)),
            ..Default::default()
        })
            .filter(payroll::Column::IsDeleted.eq(false))
            .exec(self).await
            .map_err(|err| match err {
                DbErr::RecordNotUpdated => StoreError::NotFound,
                err => err.into(),
            })?;

        Ok(record)
    }

    async fn soft_delete_payroll(&self, removal: PayrollRemoval) -> Result<payroll::Model, StoreError> {
        let txn = self.begin().await?;

        let record = Payroll::update(payroll::ActiveModel {
            id: Unchanged(removal.payroll_id),
            updated_at: Set(removal.at),
            is_deleted: Set(true),
            deleted_at: Set(Some(removal.at)),
            deleted_by: Set(Some(removal.actor_id)),
            updated_by: Set(Some(removal.actor_id)),
            ..Default::default()
        })
            .filter(payroll::Column::IsDeleted.eq(false))
            .exec(&txn).await
            .map_err(|err| match err {
                DbErr::RecordNotUpdated => StoreError::NotFound,
                err => err.into(),
            })?;

        reverse_lines(&txn, &removal.reversed_lines, removal.at).await?;
        write_advances(&txn, &removal.advances, removal.at).await?;

        txn.commit().await?;

        debug!(payroll_id = %record.id, reversed = removal.reversed_lines.len(), advances = removal.advances.len(), "payroll soft deleted");

        Ok(record)
    }

    async fn period_payrolls(&self, tenant_id: Uuid, period: Period) -> Result<Vec<payroll::Model>, StoreError> {
        let records = Payroll::find()
            .filter(payroll::Column::TenantId.eq(tenant_id))
            .filter(payroll::Column::Month.eq(period.month()))
            .filter(payroll::Column::Year.eq(period.year()))
            .filter(payroll::Column::IsDeleted.eq(false))
            .order_by_asc(payroll::Column::CreatedAt)
            .all(self).await?;

        Ok(records)
    }

    async fn employee_history(&self, tenant_id: Uuid, employee_id: Uuid, year: Option<i32>) -> Result<Vec<payroll::Model>, StoreError> {
        let records = Payroll::find()
            .filter(payroll::Column::TenantId.eq(tenant_id))
            .filter(payroll::Column::EmployeeId.eq(employee_id))
            .filter(payroll::Column::IsDeleted.eq(false))
            .apply_if(year, |query, year| query.filter(payroll::Column::Year.eq(year)))
            .order_by_desc(payroll::Column::Year)
            .order_by_desc(payroll::Column::Month)
            .all(self).await?;

        Ok(records)
    }

    async fn list_payrolls(&self, tenant_id: Uuid, filter: PayrollFilter, page: u64, limit: u64) -> Result<Paginated<payroll::Model>, StoreError> {
        let paginator = Payroll::find()
            .filter(payroll::Column::TenantId.eq(tenant_id))
            .filter(payroll::Column::IsDeleted.eq(false))
            .apply_if(filter.month, |query, month| query.filter(payroll::Column::Month.eq(month)))
            .apply_if(filter.year, |query, year| query.filter(payroll::Column::Year.eq(year)))
            .apply_if(filter.employee_id, |query, employee_id| query.filter(payroll::Column::EmployeeId.eq(employee_id)))
            .apply_if(filter.payment_status, |query, status| query.filter(payroll::Column::PaymentStatus.eq(status)))
            .order_by_desc(payroll::Column::Year)
            .order_by_desc(payroll::Column::Month)
            .order_by_asc(payroll::Column::CreatedAt)
            .paginate(self, limit);

        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(page).await?;

        Ok(Paginated {
            data,
            page: page + 1,
            limit,
            total,
        })
    }
}

async fn reverse_lines(txn: &DatabaseTransaction, line_ids: &[Uuid], at: DateTimeWithTimeZone) -> Result<(), StoreError> {
    if line_ids.is_empty() {
        return Ok(());
    }

    AdvanceDeduction::update_many()
        .col_expr(advance_deduction::Column::ReversedAt, Expr::value(at))
        .col_expr(advance_deduction::Column::UpdatedAt, Expr::value(at))
        .filter(advance_deduction::Column::Id.is_in(line_ids.to_vec()))
        .filter(advance_deduction::Column::ReversedAt.is_null())
        .exec(txn).await?;

    Ok(())
}

/// Writes each advance only if its `amount_deducted` is still what the ledger read
async fn write_advances(txn: &DatabaseTransaction, updates: &[AdvanceUpdate], at: DateTimeWithTimeZone) -> Result<(), StoreError> {
    for update in updates {
        let advance_id = update.advance.id;

        AdvanceSalary::update(advance_salary::ActiveModel {
            id: Unchanged(advance_id),
            updated_at: Set(at),
            amount_deducted: Set(update.advance.amount_deducted),
            remaining_amount: Set(update.advance.remaining_amount),
            deduction_status: Set(update.advance.deduction_status),
            ..Default::default()
        })
            .filter(advance_salary::Column::AmountDeducted.eq(update.previous_deducted))
            .exec(txn).await
            .map_err(|err| match err {
                DbErr::RecordNotUpdated => StoreError::Conflict(advance_id),
                err => err.into(),
            })?;
    }

    Ok(())
}
