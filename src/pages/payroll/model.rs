use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::{entity::sea_orm_active_enums::PaymentStatus, payroll::{generator::GenerateOptions, store::PayrollFilter}};

use super::*;

#[derive(Debug, Deserialize)]
pub(super) struct GeneratePayroll {
    pub(super) month: i64,
    pub(super) year: i64,
    #[serde(default)]
    pub(super) overwrite: bool,
    /// Per-employee bonus amounts
    #[serde(default)]
    pub(super) bonuses: HashMap<Uuid, Decimal>,
    /// Per-employee deductions other than advances
    #[serde(default)]
    pub(super) deductions: HashMap<Uuid, Decimal>,
}

impl GeneratePayroll {
    pub(super) fn into_parts(self) -> (i64, i64, GenerateOptions) {
        let options = GenerateOptions {
            overwrite: self.overwrite,
            bonuses: self.bonuses,
            deductions: self.deductions,
        };

        (self.month, self.year, options)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PeriodQuery {
    pub(super) month: i64,
    pub(super) year: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    pub(super) year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListPayrolls {
    pub(super) month: Option<i16>,
    pub(super) year: Option<i32>,
    pub(super) employee_id: Option<Uuid>,
    pub(super) payment_status: Option<PaymentStatus>,
    pub(super) page: Option<u64>,
    pub(super) limit: Option<u64>,
}

impl ListPayrolls {
    pub(super) fn filter(&self) -> PayrollFilter {
        PayrollFilter {
            month: self.month,
            year: self.year,
            employee_id: self.employee_id,
            payment_status: self.payment_status,
        }
    }
}
