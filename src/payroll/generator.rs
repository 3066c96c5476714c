use std::collections::HashMap;

use chrono::Local;
use futures_util::{stream, StreamExt as _};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::entity::{payroll, sea_orm_active_enums::PaymentStatus};

use super::{allocation::{self, AllocationError}, ledger::{Ledger, LedgerError}, store::{Employee, EmployeeDirectory, PayrollStore, PayrollWrite, StoreError}, Period};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Regenerate records that already exist for the period
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub bonuses: HashMap<Uuid, Decimal>,
    #[serde(default)]
    pub deductions: HashMap<Uuid, Decimal>,
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub tenant_id: Uuid,
    pub period: Period,
    pub actor_id: Uuid,
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeFailure {
    pub employee_id: Uuid,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// `false` only when there was nobody to pay
    pub success: bool,
    pub message: String,
    pub created: usize,
    pub skipped: usize,
    pub errors: Vec<EmployeeFailure>,
    pub records: Vec<payroll::Model>,
}

#[derive(Debug, Error)]
pub enum EmployeeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("ledger invariant violated: {0}")]
    Ledger(#[from] LedgerError),
    #[error("payroll {0} is already paid and cannot be regenerated")]
    PaidRecordLocked(Uuid),
}

/// Faults that stop a run before any employee is processed
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("unable to load eligible employees: {0}")]
    Directory(#[from] StoreError),
}

/// What happened to one employee
#[derive(Debug)]
enum Outcome {
    Created(payroll::Model),
    Skipped,
    Failed(EmployeeFailure),
}

impl BatchResult {
    fn no_eligible_employees(period: Period) -> Self {
        Self {
            success: false,
            message: format!("no eligible employees with a base salary found for {period}"),
            ..Default::default()
        }
    }

    fn record(mut self, outcome: Outcome) -> Self {
        match outcome {
            Outcome::Created(record) => {
                self.created += 1;
                self.records.push(record);
            }
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed(failure) => self.errors.push(failure),
        }

        self
    }

    fn finish(mut self, period: Period) -> Self {
        self.success = true;
        self.message = format!(
            "payroll for {period}: {} generated, {} skipped, {} failed",
            self.created,
            self.skipped,
            self.errors.len(),
        );

        self
    }
}

/// Generates one payroll record per eligible employee for `request.period`.
///
/// Employees are processed independently, at most `concurrency` at a time.
/// A failing employee lands in [`BatchResult::errors`] and never affects the
/// others. Without `overwrite`, employees that already have a record are
/// skipped, so running the same request again is a no-op.
pub async fn generate<D, S>(directory: &D, store: &S, request: &GenerateRequest, concurrency: usize) -> Result<BatchResult, GenerateError>
where
    D: EmployeeDirectory + ?Sized,
    S: PayrollStore + ?Sized,
{
    let GenerateRequest { tenant_id, period, .. } = *request;

    let employees = directory.find_eligible_employees(tenant_id).await?;

    if employees.is_empty() {
        warn!(%tenant_id, %period, "no eligible employees for payroll run");
        return Ok(BatchResult::no_eligible_employees(period));
    }

    info!(%tenant_id, %period, employees = employees.len(), overwrite = request.options.overwrite, "starting payroll run");

    let now = Local::now().fixed_offset();

    let batch = stream::iter(employees)
        .map(move |employee| async move {
            match generate_for_employee(store, request, &employee, now).await {
                Ok(Some(record)) => Outcome::Created(record),
                Ok(None) | Err(EmployeeError::Store(StoreError::Duplicate)) => {
                    debug!(employee_id = %employee.id, %period, "payroll already exists, skipping");
                    Outcome::Skipped
                }
                Err(err) => {
                    if let EmployeeError::Ledger(_) = err {
                        error!(employee_id = %employee.id, %period, error = %err, "payroll aborted by ledger invariant");
                    } else {
                        warn!(employee_id = %employee.id, %period, error = %err, "payroll generation failed");
                    }

                    Outcome::Failed(EmployeeFailure {
                        employee_id: employee.id,
                        name: employee.name,
                        error: err.to_string(),
                    })
                }
            }
        })
        .buffered(concurrency.max(1))
        .fold(BatchResult::default(), |batch, outcome| async move { batch.record(outcome) })
        .await
        .finish(period);

    info!(%tenant_id, %period, created = batch.created, skipped = batch.skipped, failed = batch.errors.len(), "payroll run finished");

    Ok(batch)
}

/// `Ok(None)` when the record exists and overwriting was not requested
async fn generate_for_employee<S>(store: &S, request: &GenerateRequest, employee: &Employee, now: DateTimeWithTimeZone) -> Result<Option<payroll::Model>, EmployeeError>
where
    S: PayrollStore + ?Sized,
{
    let GenerateRequest { tenant_id, period, actor_id, ref options } = *request;

    let existing = match store.find_payroll(tenant_id, employee.id, period).await? {
        Some(_) if !options.overwrite => return Ok(None),
        Some(record) if record.payment_status == PaymentStatus::Paid => {
            return Err(EmployeeError::PaidRecordLocked(record.id));
        }
        existing => existing,
    };

    let mut advances = store.open_advances(tenant_id, employee.id).await?;

    // Regeneration gives back what the replaced record took before allocating again
    let reversed = match &existing {
        Some(record) => store.payroll_deductions(tenant_id, record.id).await?,
        None => Vec::new(),
    };

    let mut missing = reversed.iter()
        .map(|line| line.advance_salary_id)
        .filter(|id| !advances.iter().any(|a| a.id == *id))
        .collect::<Vec<_>>();
    missing.sort();
    missing.dedup();
    advances.extend(store.find_advances(tenant_id, missing).await?);

    let mut ledger = Ledger::new(advances);
    for line in &reversed {
        ledger.reverse(line)?;
    }

    let bonuses = options.bonuses.get(&employee.id).copied().unwrap_or_default();
    let other_deductions = options.deductions.get(&employee.id).copied().unwrap_or_default();

    let allocation = allocation::allocate(employee.base_salary, bonuses, other_deductions, &ledger.open_advances(), now)?;

    for line in &allocation.lines {
        ledger.apply(line)?;
    }

    let record = store.save_payroll(PayrollWrite {
        tenant_id,
        employee_id: employee.id,
        period,
        replaces: existing.as_ref().map(|r| r.id),
        base_salary: employee.base_salary,
        bonuses,
        other_deductions,
        total_advance_deduction: allocation.total_advance_deduction,
        net_salary: allocation.net_salary,
        actor_id,
        at: now,
        lines: allocation.lines,
        reversed_lines: reversed.iter().map(|line| line.id).collect(),
        advances: ledger.into_updates(),
    }).await?;

    debug!(employee_id = %employee.id, %period, net_salary = %record.net_salary, "payroll generated");

    Ok(Some(record))
}
