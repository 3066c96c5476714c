//! Administrative edits of generated payroll records.

use chrono::Local;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::entity::{payroll, sea_orm_active_enums::PaymentStatus};

use super::{ledger::{Ledger, LedgerError}, store::{PaymentUpdate, PayrollRemoval, PayrollStore, StoreError}};

/// Payment fields to change. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentPatch {
    pub payment_status: Option<PaymentStatus>,
    pub payment_date: Option<DateTimeWithTimeZone>,
    pub payment_method: Option<String>,
    pub remarks: Option<String>,
}

impl PaymentPatch {
    pub fn is_empty(&self) -> bool {
        self.payment_status.is_none()
            && self.payment_date.is_none()
            && self.payment_method.is_none()
            && self.remarks.is_none()
    }

    /// Merges the patch over `record`. Marking a record paid without a date stamps it with `now`.
    fn resolve(self, record: &payroll::Model, now: DateTimeWithTimeZone) -> PaymentUpdate {
        let payment_status = self.payment_status.unwrap_or(record.payment_status);

        let payment_date = match (self.payment_date.or(record.payment_date), payment_status) {
            (None, PaymentStatus::Paid) => Some(now),
            (date, _) => date,
        };

        PaymentUpdate {
            payment_status,
            payment_date,
            payment_method: self.payment_method.or_else(|| record.payment_method.clone()),
            remarks: self.remarks.or_else(|| record.remarks.clone()),
        }
    }
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("payroll {0} has been deleted")]
    Deleted(Uuid),
    #[error("nothing to update")]
    EmptyPatch,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub fn ensure_editable(record: &payroll::Model) -> Result<(), EditError> {
    if record.is_deleted {
        return Err(EditError::Deleted(record.id));
    }

    Ok(())
}

pub async fn update_payment<S: PayrollStore + ?Sized>(store: &S, record: &payroll::Model, patch: PaymentPatch, actor_id: Uuid) -> Result<payroll::Model, EditError> {
    ensure_editable(record)?;

    if patch.is_empty() {
        return Err(EditError::EmptyPatch);
    }

    let now = Local::now().fixed_offset();
    let update = patch.resolve(record, now);
    let updated = store.update_payment(record.id, update, actor_id, now).await?;

    info!(payroll_id = %updated.id, %actor_id, payment_status = ?updated.payment_status, "payroll payment updated");

    Ok(updated)
}

/// Hides the record from every listing and gives its active advance lines back to their advances
pub async fn soft_delete<S: PayrollStore + ?Sized>(store: &S, record: &payroll::Model, actor_id: Uuid) -> Result<payroll::Model, EditError> {
    ensure_editable(record)?;

    let lines = store.payroll_deductions(record.tenant_id, record.id).await?;

    let mut advance_ids = lines.iter().map(|line| line.advance_salary_id).collect::<Vec<_>>();
    advance_ids.sort();
    advance_ids.dedup();

    let mut ledger = Ledger::new(store.find_advances(record.tenant_id, advance_ids).await?);
    for line in &lines {
        ledger.reverse(line)?;
    }

    let deleted = store.soft_delete_payroll(PayrollRemoval {
        payroll_id: record.id,
        actor_id,
        at: Local::now().fixed_offset(),
        reversed_lines: lines.iter().map(|line| line.id).collect(),
        advances: ledger.into_updates(),
    }).await?;

    info!(payroll_id = %deleted.id, %actor_id, reversed = lines.len(), "payroll deleted");

    Ok(deleted)
}
