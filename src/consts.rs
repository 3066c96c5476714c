use rust_decimal::Decimal;

use crate::entity::sea_orm_active_enums::RoleType;

/// Share of base salary a single advance may claim in one period
pub const ADVANCE_CAP_RATIO: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Money is stored with two decimal places
pub const MONEY_SCALE: u32 = 2;

pub const PAYROLL_ELIGIBLE_ROLES: [RoleType; 4] = [
    RoleType::Teacher,
    RoleType::Staff,
    RoleType::Accountant,
    RoleType::Librarian,
];

pub const ADMIN_ROLES: [RoleType; 2] = [RoleType::SuperAdmin, RoleType::Admin];

pub const DEFAULT_PAYROLL_CONCURRENCY: usize = 4;

/// (default, max) page size for payroll listings
pub const PAGE_LIMIT: (u64, u64) = (10, 100);

/// Years accepted for a payroll period
pub const PERIOD_YEARS: (i32, i32) = (2000, 2100);
