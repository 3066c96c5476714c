//! Monthly payroll generation and salary advance settlement.
//!
//! [`generator::generate`] walks every eligible employee of a school for one
//! [`Period`], runs [`allocation::allocate`] against that employee's open
//! advances and persists the record together with the [`ledger`] changes.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::consts::PERIOD_YEARS;

pub mod allocation;
pub mod generator;
pub mod ledger;
pub mod records;
pub mod store;
pub mod summary;

/// One payroll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    month: i16,
    year: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(i64),
    #[error("year {0} is outside the supported range")]
    InvalidYear(i64),
}

impl Period {
    pub fn new(month: i64, year: i64) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }

        if !(PERIOD_YEARS.0 as i64..=PERIOD_YEARS.1 as i64).contains(&year) {
            return Err(PeriodError::InvalidYear(year));
        }

        Ok(Self {
            month: month as i16,
            year: year as i32,
        })
    }

    pub fn month(&self) -> i16 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
