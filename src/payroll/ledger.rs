//! Advance balance bookkeeping.
//!
//! A [`Ledger`] holds working copies of the advances one payroll touches.
//! Reversals and deductions are applied to the copies first; the store then
//! writes every touched advance in the same transaction as the payroll,
//! guarded on the `amount_deducted` that was originally read.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::entity::{advance_deduction, advance_salary, sea_orm_active_enums::{ApprovalStatus, DeductionStatus}};

use super::allocation::DeductionLine;

/// Broken ledger invariants. These indicate a defect, never bad user input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("advance {0} is not approved")]
    NotApproved(Uuid),
    #[error("advance {0} is already fully deducted")]
    Closed(Uuid),
    #[error("advance {0} is not part of this ledger")]
    Unknown(Uuid),
    #[error("deduction of {amount} on advance {advance_id} is not positive")]
    NonPositive { advance_id: Uuid, amount: Decimal },
    #[error("deducting {amount} from advance {advance_id} would overdraw its remaining {remaining}")]
    Overdraw { advance_id: Uuid, amount: Decimal, remaining: Decimal },
    #[error("reversing {amount} on advance {advance_id} exceeds the {deducted} deducted so far")]
    ReversalExceedsDeducted { advance_id: Uuid, amount: Decimal, deducted: Decimal },
}

/// An advance to be written back, with the `amount_deducted` it was read with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceUpdate {
    pub advance: advance_salary::Model,
    pub previous_deducted: Decimal,
}

#[derive(Debug)]
struct Entry {
    advance: advance_salary::Model,
    previous_deducted: Decimal,
    touched: bool,
}

#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<Entry>,
}

impl Ledger {
    pub fn new(advances: impl IntoIterator<Item = advance_salary::Model>) -> Self {
        let mut entries: Vec<Entry> = Vec::new();

        for advance in advances {
            if entries.iter().any(|e| e.advance.id == advance.id) {
                continue;
            }

            entries.push(Entry {
                previous_deducted: advance.amount_deducted,
                advance,
                touched: false,
            });
        }

        Self { entries }
    }

    /// Advances that can still take a deduction, oldest request first
    pub fn open_advances(&self) -> Vec<advance_salary::Model> {
        let mut open = self.entries.iter()
            .map(|e| &e.advance)
            .filter(|a| a.approval_status == ApprovalStatus::Approved)
            .filter(|a| a.deduction_status != DeductionStatus::Complete)
            .filter(|a| a.remaining_amount > Decimal::ZERO)
            .cloned()
            .collect::<Vec<_>>();

        open.sort_by(settlement_order);
        open
    }

    /// Gives back a previously applied line, e.g. before its payroll is regenerated
    pub fn reverse(&mut self, line: &advance_deduction::Model) -> Result<(), LedgerError> {
        let entry = self.entry(line.advance_salary_id)?;
        reverse_deduction(&mut entry.advance, line.amount)?;
        entry.touched = true;

        Ok(())
    }

    pub fn apply(&mut self, line: &DeductionLine) -> Result<(), LedgerError> {
        let entry = self.entry(line.advance_salary_id)?;
        apply_deduction(&mut entry.advance, line.amount)?;
        entry.touched = true;

        Ok(())
    }

    pub fn into_updates(self) -> Vec<AdvanceUpdate> {
        self.entries.into_iter()
            .filter(|e| e.touched)
            .map(|e| AdvanceUpdate {
                advance: e.advance,
                previous_deducted: e.previous_deducted,
            })
            .collect()
    }

    fn entry(&mut self, advance_id: Uuid) -> Result<&mut Entry, LedgerError> {
        self.entries.iter_mut()
            .find(|e| e.advance.id == advance_id)
            .ok_or_else(|| violation(LedgerError::Unknown(advance_id)))
    }
}

/// FIFO: request date, then creation, then id so ties stay deterministic
pub fn settlement_order(a: &advance_salary::Model, b: &advance_salary::Model) -> Ordering {
    a.request_date.cmp(&b.request_date)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn apply_deduction(advance: &mut advance_salary::Model, amount: Decimal) -> Result<(), LedgerError> {
    if advance.approval_status != ApprovalStatus::Approved {
        return Err(violation(LedgerError::NotApproved(advance.id)));
    }

    if advance.deduction_status == DeductionStatus::Complete {
        return Err(violation(LedgerError::Closed(advance.id)));
    }

    if amount <= Decimal::ZERO {
        return Err(violation(LedgerError::NonPositive { advance_id: advance.id, amount }));
    }

    if amount > advance.remaining_amount {
        return Err(violation(LedgerError::Overdraw {
            advance_id: advance.id,
            amount,
            remaining: advance.remaining_amount,
        }));
    }

    advance.amount_deducted += amount;
    settle(advance);

    Ok(())
}

pub fn reverse_deduction(advance: &mut advance_salary::Model, amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(violation(LedgerError::NonPositive { advance_id: advance.id, amount }));
    }

    if amount > advance.amount_deducted {
        return Err(violation(LedgerError::ReversalExceedsDeducted {
            advance_id: advance.id,
            amount,
            deducted: advance.amount_deducted,
        }));
    }

    advance.amount_deducted -= amount;
    settle(advance);

    Ok(())
}

/// Recomputes `remaining_amount` and `deduction_status` from `amount_deducted`
fn settle(advance: &mut advance_salary::Model) {
    advance.remaining_amount = advance.amount_requested - advance.amount_deducted;

    advance.deduction_status = if advance.remaining_amount.is_zero() {
        DeductionStatus::Complete
    } else if advance.amount_deducted.is_zero() {
        DeductionStatus::Pending
    } else {
        DeductionStatus::Partial
    };
}

fn violation(err: LedgerError) -> LedgerError {
    error!(target: "payroll::ledger", error = %err, "advance ledger invariant violated");
    err
}
