use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{consts::ADVANCE_CAP_RATIO, entity::advance_salary, utils};

/// Amount taken from one advance against one payroll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeductionLine {
    pub advance_salary_id: Uuid,
    pub amount: Decimal,
    pub applied_at: DateTimeWithTimeZone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub lines: Vec<DeductionLine>,
    pub total_advance_deduction: Decimal,
    pub net_salary: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("base salary must be positive, got {0}")]
    NonPositiveBaseSalary(Decimal),
    #[error("bonuses must not be negative, got {0}")]
    NegativeBonuses(Decimal),
    #[error("other deductions must not be negative, got {0}")]
    NegativeDeductions(Decimal),
}

/// Settles open advances against one period's pay.
///
/// `open_advances` must already be in settlement order, oldest request first.
/// Each advance is offered at most half of `base_salary`; it is taken only if
/// the running total stays within `base_salary`, otherwise it is left for a
/// later period and the next advance is tried.
///
/// Net salary is floored at zero.
pub fn allocate(
    base_salary: Decimal,
    bonuses: Decimal,
    other_deductions: Decimal,
    open_advances: &[advance_salary::Model],
    applied_at: DateTimeWithTimeZone,
) -> Result<Allocation, AllocationError> {
    if base_salary <= Decimal::ZERO {
        return Err(AllocationError::NonPositiveBaseSalary(base_salary));
    }

    if bonuses < Decimal::ZERO {
        return Err(AllocationError::NegativeBonuses(bonuses));
    }

    if other_deductions < Decimal::ZERO {
        return Err(AllocationError::NegativeDeductions(other_deductions));
    }

    let per_advance_cap = utils::truncate_money(base_salary * ADVANCE_CAP_RATIO);

    let (lines, total_advance_deduction) = open_advances.iter().fold(
        (Vec::new(), Decimal::ZERO),
        |(mut lines, total), advance| {
            let candidate = advance.remaining_amount.min(per_advance_cap);

            if candidate <= Decimal::ZERO || total + candidate > base_salary {
                return (lines, total);
            }

            lines.push(DeductionLine {
                advance_salary_id: advance.id,
                amount: candidate,
                applied_at,
            });

            (lines, total + candidate)
        },
    );

    let net_salary = (base_salary + bonuses - other_deductions - total_advance_deduction).max(Decimal::ZERO);

    Ok(Allocation {
        lines,
        total_advance_deduction,
        net_salary,
    })
}
