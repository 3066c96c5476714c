use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::entity::{advance_deduction, advance_salary, payroll, sea_orm_active_enums::PaymentStatus};

use super::{store::{Paginated, PayrollFilter, PayrollStore, StoreError}, Period};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub paid: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalarySummary {
    pub period: Period,
    pub total_records: u64,
    pub total_base_salary: Decimal,
    pub total_bonuses: Decimal,
    pub total_deductions: Decimal,
    pub total_advance_deductions: Decimal,
    pub total_net_salary: Decimal,
    pub by_status: StatusCounts,
}

/// A payroll with the advance lines currently applied to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayrollDetail {
    #[serde(flatten)]
    pub record: payroll::Model,
    pub advance_deductions: Vec<advance_deduction::Model>,
}

/// An advance with every line ever applied to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvanceLedger {
    #[serde(flatten)]
    pub advance: advance_salary::Model,
    pub deductions: Vec<advance_deduction::Model>,
}

/// Totals over the live records of one period
pub fn summarize(period: Period, records: &[payroll::Model]) -> SalarySummary {
    let init = SalarySummary {
        period,
        total_records: 0,
        total_base_salary: Decimal::ZERO,
        total_bonuses: Decimal::ZERO,
        total_deductions: Decimal::ZERO,
        total_advance_deductions: Decimal::ZERO,
        total_net_salary: Decimal::ZERO,
        by_status: StatusCounts::default(),
    };

    records.iter()
        .filter(|r| !r.is_deleted)
        .fold(init, |mut summary, record| {
            summary.total_records += 1;
            summary.total_base_salary += record.base_salary;
            summary.total_bonuses += record.bonuses;
            summary.total_deductions += record.other_deductions;
            summary.total_advance_deductions += record.total_advance_deduction;
            summary.total_net_salary += record.net_salary;

            match record.payment_status {
                PaymentStatus::Pending => summary.by_status.pending += 1,
                PaymentStatus::Paid => summary.by_status.paid += 1,
                PaymentStatus::Cancelled => summary.by_status.cancelled += 1,
            }

            summary
        })
}

pub async fn get_salary_summary<S: PayrollStore + ?Sized>(store: &S, tenant_id: Uuid, period: Period) -> Result<SalarySummary, StoreError> {
    let records = store.period_payrolls(tenant_id, period).await?;

    Ok(summarize(period, &records))
}

pub async fn get_employee_payroll_history<S: PayrollStore + ?Sized>(store: &S, tenant_id: Uuid, employee_id: Uuid, year: Option<i32>) -> Result<Vec<payroll::Model>, StoreError> {
    store.employee_history(tenant_id, employee_id, year).await
}

/// `page` is 1-based
pub async fn get_payroll_records<S: PayrollStore + ?Sized>(store: &S, tenant_id: Uuid, filter: PayrollFilter, page: Option<u64>, limit: Option<u64>) -> Result<Paginated<payroll::Model>, StoreError> {
    let (page, limit) = crate::utils::page_window(page, limit);

    store.list_payrolls(tenant_id, filter, page, limit).await
}

pub async fn payroll_detail<S: PayrollStore + ?Sized>(store: &S, record: payroll::Model) -> Result<PayrollDetail, StoreError> {
    let advance_deductions = store.payroll_deductions(record.tenant_id, record.id).await?;

    Ok(PayrollDetail {
        record,
        advance_deductions,
    })
}

pub async fn advance_ledger<S: PayrollStore + ?Sized>(store: &S, tenant_id: Uuid, advance_id: Uuid) -> Result<AdvanceLedger, StoreError> {
    let advance = store.find_advance(tenant_id, advance_id).await?.ok_or(StoreError::NotFound)?;
    let deductions = store.advance_deductions(tenant_id, advance.id).await?;

    Ok(AdvanceLedger {
        advance,
        deductions,
    })
}
