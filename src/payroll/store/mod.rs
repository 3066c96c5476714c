//! What the payroll engine needs from the rest of the system.
//!
//! [`EmployeeDirectory`] and [`PayrollStore`] are implemented for
//! [`sea_orm::DatabaseConnection`] in [`database`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{prelude::DateTimeWithTimeZone, DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{consts::PAYROLL_ELIGIBLE_ROLES, entity::{advance_deduction, advance_salary, payroll, sea_orm_active_enums::PaymentStatus, user}};

use super::{allocation::DeductionLine, ledger::AdvanceUpdate, Period};

mod database;
#[cfg(test)]
pub(crate) mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A live payroll already exists for the same employee and period
    #[error("record already exists")]
    Duplicate,
    #[error("record not found")]
    NotFound,
    #[error("advance {0} was modified concurrently")]
    Conflict(Uuid),
    #[error("database error: {0}")]
    Db(DbErr),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Duplicate,
            _ => StoreError::Db(err),
        }
    }
}

/// A staff member the payroll run is allowed to pay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub employee_code: Option<String>,
    pub base_salary: Decimal,
}

impl Employee {
    /// `None` when the user is inactive, not in a payroll role or has no salary
    pub fn from_user(user: user::Model) -> Option<Self> {
        if !user.is_active || !PAYROLL_ELIGIBLE_ROLES.contains(&user.role) {
            return None;
        }

        let base_salary = user.salary.filter(|s| *s > Decimal::ZERO)?;

        Some(Self {
            id: user.id,
            name: user.full_name,
            employee_code: user.employee_code,
            base_salary,
        })
    }
}

/// Everything persisted for one employee in one period, written atomically
#[derive(Debug, Clone)]
pub struct PayrollWrite {
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub period: Period,
    /// Existing record being regenerated in place
    pub replaces: Option<Uuid>,
    pub base_salary: Decimal,
    pub bonuses: Decimal,
    pub other_deductions: Decimal,
    pub total_advance_deduction: Decimal,
    pub net_salary: Decimal,
    pub actor_id: Uuid,
    pub at: DateTimeWithTimeZone,
    pub lines: Vec<DeductionLine>,
    /// Lines of the replaced record to mark reversed
    pub reversed_lines: Vec<Uuid>,
    pub advances: Vec<AdvanceUpdate>,
}

/// A soft delete together with the ledger effects it gives back, written atomically
#[derive(Debug, Clone)]
pub struct PayrollRemoval {
    pub payroll_id: Uuid,
    pub actor_id: Uuid,
    pub at: DateTimeWithTimeZone,
    /// Active lines of the deleted record to mark reversed
    pub reversed_lines: Vec<Uuid>,
    pub advances: Vec<AdvanceUpdate>,
}

/// Resolved payment metadata for an administrative edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub payment_status: PaymentStatus,
    pub payment_date: Option<DateTimeWithTimeZone>,
    pub payment_method: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollFilter {
    pub month: Option<i16>,
    pub year: Option<i32>,
    pub employee_id: Option<Uuid>,
    pub payment_status: Option<PaymentStatus>,
}

impl PayrollFilter {
    pub fn matches(&self, record: &payroll::Model) -> bool {
        self.month.is_none_or(|m| record.month == m)
            && self.year.is_none_or(|y| record.year == y)
            && self.employee_id.is_none_or(|e| record.employee_id == e)
            && self.payment_status.is_none_or(|s| record.payment_status == s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    /// 1-based
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

#[async_trait]
pub trait EmployeeDirectory: Sync {
    async fn find_eligible_employees(&self, tenant_id: Uuid) -> Result<Vec<Employee>, StoreError>;
}

/// Tenant-scoped payroll and advance persistence.
///
/// Soft-deleted payrolls are invisible to every lookup except
/// [`PayrollStore::find_payroll_by_id`].
#[async_trait]
pub trait PayrollStore: Sync {
    async fn find_payroll(&self, tenant_id: Uuid, employee_id: Uuid, period: Period) -> Result<Option<payroll::Model>, StoreError>;

    async fn find_payroll_by_id(&self, tenant_id: Uuid, payroll_id: Uuid) -> Result<Option<payroll::Model>, StoreError>;

    /// Approved advances with a pending or partial deduction, oldest request first
    async fn open_advances(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<Vec<advance_salary::Model>, StoreError>;

    async fn find_advances(&self, tenant_id: Uuid, advance_ids: Vec<Uuid>) -> Result<Vec<advance_salary::Model>, StoreError>;

    async fn find_advance(&self, tenant_id: Uuid, advance_id: Uuid) -> Result<Option<advance_salary::Model>, StoreError>;

    /// Lines of a payroll that have not been reversed
    async fn payroll_deductions(&self, tenant_id: Uuid, payroll_id: Uuid) -> Result<Vec<advance_deduction::Model>, StoreError>;

    /// Every line ever applied to an advance, reversed ones included
    async fn advance_deductions(&self, tenant_id: Uuid, advance_id: Uuid) -> Result<Vec<advance_deduction::Model>, StoreError>;

    async fn save_payroll(&self, write: PayrollWrite) -> Result<payroll::Model, StoreError>;

    async fn update_payment(&self, payroll_id: Uuid, update: PaymentUpdate, actor_id: Uuid, at: DateTimeWithTimeZone) -> Result<payroll::Model, StoreError>;

    async fn soft_delete_payroll(&self, removal: PayrollRemoval) -> Result<payroll::Model, StoreError>;

    async fn period_payrolls(&self, tenant_id: Uuid, period: Period) -> Result<Vec<payroll::Model>, StoreError>;

    /// Newest period first
    async fn employee_history(&self, tenant_id: Uuid, employee_id: Uuid, year: Option<i32>) -> Result<Vec<payroll::Model>, StoreError>;

    /// `page` is 0-based here
    async fn list_payrolls(&self, tenant_id: Uuid, filter: PayrollFilter, page: u64, limit: u64) -> Result<Paginated<payroll::Model>, StoreError>;
}
