use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;
use sea_orm::{prelude::DateTimeWithTimeZone, DbErr};
use uuid::Uuid;

use crate::{entity::{advance_deduction, advance_salary, payroll, sea_orm_active_enums::{ApprovalStatus, DeductionStatus, PaymentStatus}, user}, payroll::{ledger::{settlement_order, AdvanceUpdate}, Period}};

use super::{Employee, EmployeeDirectory, Paginated, PaymentUpdate, PayrollFilter, PayrollRemoval, PayrollStore, PayrollWrite, StoreError};

/// Store backed by plain vectors, with the same uniqueness and guard rules as the database
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    data: Mutex<MemoryData>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryData {
    pub(crate) users: Vec<user::Model>,
    pub(crate) advances: Vec<advance_salary::Model>,
    pub(crate) payrolls: Vec<payroll::Model>,
    pub(crate) deductions: Vec<advance_deduction::Model>,
    /// Employees whose payroll writes fail
    pub(crate) failing_saves: HashSet<Uuid>,
    /// Employees whose existing payroll is not seen by `find_payroll`, as if another run inserted it concurrently
    pub(crate) stale_reads: HashSet<Uuid>,
}

impl MemoryStore {
    pub(crate) fn with<T>(&self, f: impl FnOnce(&mut MemoryData) -> T) -> T {
        let mut data = self.data.lock().unwrap();
        f(&mut data)
    }

    pub(crate) fn payrolls(&self) -> Vec<payroll::Model> {
        self.with(|data| data.payrolls.clone())
    }

    pub(crate) fn advance(&self, advance_id: Uuid) -> advance_salary::Model {
        self.with(|data| data.advances.iter().find(|a| a.id == advance_id).cloned().unwrap())
    }

    pub(crate) fn deductions(&self) -> Vec<advance_deduction::Model> {
        self.with(|data| data.deductions.clone())
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn find_eligible_employees(&self, tenant_id: Uuid) -> Result<Vec<Employee>, StoreError> {
        let mut users = self.with(|data| data.users.iter().filter(|u| u.tenant_id == tenant_id).cloned().collect::<Vec<_>>());
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name).then_with(|| a.id.cmp(&b.id)));

        Ok(users.into_iter().filter_map(Employee::from_user).collect())
    }
}

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn find_payroll(&self, tenant_id: Uuid, employee_id: Uuid, period: Period) -> Result<Option<payroll::Model>, StoreError> {
        Ok(self.with(|data| {
            if data.stale_reads.contains(&employee_id) {
                return None;
            }

            live_payroll(&data.payrolls, tenant_id, employee_id, period).cloned()
        }))
    }

    async fn find_payroll_by_id(&self, tenant_id: Uuid, payroll_id: Uuid) -> Result<Option<payroll::Model>, StoreError> {
        Ok(self.with(|data| data.payrolls.iter().find(|p| p.id == payroll_id && p.tenant_id == tenant_id).cloned()))
    }

    async fn open_advances(&self, tenant_id: Uuid, employee_id: Uuid) -> Result<Vec<advance_salary::Model>, StoreError> {
        let mut advances = self.with(|data| data.advances.iter()
            .filter(|a| a.tenant_id == tenant_id && a.employee_id == employee_id)
            .filter(|a| a.approval_status == ApprovalStatus::Approved)
            .filter(|a| matches!(a.deduction_status, DeductionStatus::Pending | DeductionStatus::Partial))
            .cloned()
            .collect::<Vec<_>>());
        advances.sort_by(settlement_order);

        Ok(advances)
    }

    async fn find_advances(&self, tenant_id: Uuid, advance_ids: Vec<Uuid>) -> Result<Vec<advance_salary::Model>, StoreError> {
        Ok(self.with(|data| data.advances.iter()
            .filter(|a| a.tenant_id == tenant_id && advance_ids.contains(&a.id))
            .cloned()
            .collect()))
    }

    async fn find_advance(&self, tenant_id: Uuid, advance_id: Uuid) -> Result<Option<advance_salary::Model>, StoreError> {
        Ok(self.with(|data| data.advances.iter().find(|a| a.id == advance_id && a.tenant_id == tenant_id).cloned()))
    }

    async fn payroll_deductions(&self, tenant_id: Uuid, payroll_id: Uuid) -> Result<Vec<advance_deduction::Model>, StoreError> {
        Ok(self.with(|data| data.deductions.iter()
            .filter(|d| d.tenant_id == tenant_id && d.payroll_id == payroll_id && d.reversed_at.is_none())
            .cloned()
            .collect()))
    }

    async fn advance_deductions(&self, tenant_id: Uuid, advance_id: Uuid) -> Result<Vec<advance_deduction::Model>, StoreError> {
        Ok(self.with(|data| data.deductions.iter()
            .filter(|d| d.tenant_id == tenant_id && d.advance_salary_id == advance_id)
            .cloned()
            .collect()))
    }

    async fn save_payroll(&self, write: PayrollWrite) -> Result<payroll::Model, StoreError> {
        self.with(|data| {
            if data.failing_saves.contains(&write.employee_id) {
                return Err(StoreError::Db(DbErr::Custom("connection reset".to_string())));
            }

            // Validate everything before touching anything, like a rolled back transaction
            match write.replaces {
                Some(payroll_id) => {
                    if !data.payrolls.iter().any(|p| p.id == payroll_id && !p.is_deleted) {
                        return Err(StoreError::NotFound);
                    }
                }
                None => {
                    if live_payroll(&data.payrolls, write.tenant_id, write.employee_id, write.period).is_some() {
                        return Err(StoreError::Duplicate);
                    }
                }
            }

            check_advances(data, &write.advances)?;

            let record = match write.replaces {
                Some(payroll_id) => {
                    let record = data.payrolls.iter_mut().find(|p| p.id == payroll_id).ok_or(StoreError::NotFound)?;
                    record.updated_at = write.at;
                    record.base_salary = write.base_salary;
                    record.bonuses = write.bonuses;
                    record.other_deductions = write.other_deductions;
                    record.total_advance_deduction = write.total_advance_deduction;
                    record.net_salary = write.net_salary;
                    record.updated_by = Some(write.actor_id);
                    record.generated_at = write.at;
                    record.clone()
                }
                None => {
                    let record = payroll::Model {
                        id: Uuid::new_v4(),
                        created_at: write.at,
                        updated_at: write.at,
                        tenant_id: write.tenant_id,
                        employee_id: write.employee_id,
                        month: write.period.month(),
                        year: write.period.year(),
                        base_salary: write.base_salary,
                        bonuses: write.bonuses,
                        other_deductions: write.other_deductions,
                        total_advance_deduction: write.total_advance_deduction,
                        net_salary: write.net_salary,
                        payment_status: PaymentStatus::Pending,
                        payment_date: None,
                        payment_method: None,
                        remarks: None,
                        is_deleted: false,
                        deleted_at: None,
                        deleted_by: None,
                        generated_by: write.actor_id,
                        updated_by: None,
                        generated_at: write.at,
                    };
                    data.payrolls.push(record.clone());
                    record
                }
            };

            reverse_lines(data, &write.reversed_lines, write.at);

            data.deductions.extend(write.lines.iter().map(|line| advance_deduction::Model {
                id: Uuid::new_v4(),
                created_at: write.at,
                updated_at: write.at,
                tenant_id: write.tenant_id,
                advance_salary_id: line.advance_salary_id,
                payroll_id: record.id,
                amount: line.amount,
                month: write.period.month(),
                year: write.period.year(),
                applied_at: line.applied_at,
                reversed_at: None,
            }));

            write_advances(data, &write.advances, write.at);

            Ok(record)
        })
    }

    async fn update_payment(&self, payroll_id: Uuid, update: PaymentUpdate, actor_id: Uuid, at: DateTimeWithTimeZone) -> Result<payroll::Model, StoreError> {
        self.with(|data| {
            let record = data.payrolls.iter_mut().find(|p| p.id == payroll_id && !p.is_deleted).ok_or(StoreError::NotFound)?;
            record.payment_status = update.payment_status;
            record.payment_date = update.payment_date;
            record.payment_method = update.payment_method;
            record.remarks = update.remarks;
            record.updated_by = Some(actor_id);
            record.updated_at = at;

            Ok(record.clone())
        })
    }

    async fn soft_delete_payroll(&self, removal: PayrollRemoval) -> Result<payroll::Model, StoreError> {
        self.with(|data| {
            if !data.payrolls.iter().any(|p| p.id == removal.payroll_id && !p.is_deleted) {
                return Err(StoreError::NotFound);
            }

            check_advances(data, &removal.advances)?;

            let record = data.payrolls.iter_mut().find(|p| p.id == removal.payroll_id).ok_or(StoreError::NotFound)?;
            record.is_deleted = true;
            record.deleted_at = Some(removal.at);
            record.deleted_by = Some(removal.actor_id);
            record.updated_by = Some(removal.actor_id);
            record.updated_at = removal.at;
            let record = record.clone();

            reverse_lines(data, &removal.reversed_lines, removal.at);
            write_advances(data, &removal.advances, removal.at);

            Ok(record)
        })
    }

    async fn period_payrolls(&self, tenant_id: Uuid, period: Period) -> Result<Vec<payroll::Model>, StoreError> {
        Ok(self.with(|data| data.payrolls.iter()
            .filter(|p| p.tenant_id == tenant_id && !p.is_deleted)
            .filter(|p| p.month == period.month() && p.year == period.year())
            .cloned()
            .collect()))
    }

    async fn employee_history(&self, tenant_id: Uuid, employee_id: Uuid, year: Option<i32>) -> Result<Vec<payroll::Model>, StoreError> {
        let mut records = self.with(|data| data.payrolls.iter()
            .filter(|p| p.tenant_id == tenant_id && p.employee_id == employee_id && !p.is_deleted)
            .filter(|p| year.is_none_or(|y| p.year == y))
            .cloned()
            .collect::<Vec<_>>());
        records.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));

        Ok(records)
    }

    async fn list_payrolls(&self, tenant_id: Uuid, filter: PayrollFilter, page: u64, limit: u64) -> Result<Paginated<payroll::Model>, StoreError> {
        let mut records = self.with(|data| data.payrolls.iter()
            .filter(|p| p.tenant_id == tenant_id && !p.is_deleted && filter.matches(p))
            .cloned()
            .collect::<Vec<_>>());
        records.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)).then_with(|| a.created_at.cmp(&b.created_at)));

        let total = records.len() as u64;
        let data = records.into_iter()
            .skip((page * limit) as usize)
            .take(limit as usize)
            .collect();

        Ok(Paginated {
            data,
            page: page + 1,
            limit,
            total,
        })
    }
}

fn live_payroll(payrolls: &[payroll::Model], tenant_id: Uuid, employee_id: Uuid, period: Period) -> Option<&payroll::Model> {
    payrolls.iter().find(|p| {
        p.tenant_id == tenant_id
            && p.employee_id == employee_id
            && p.month == period.month()
            && p.year == period.year()
            && !p.is_deleted
    })
}

fn check_advances(data: &MemoryData, updates: &[AdvanceUpdate]) -> Result<(), StoreError> {
    for update in updates {
        let current = data.advances.iter().find(|a| a.id == update.advance.id);
        if current.is_none_or(|a| a.amount_deducted != update.previous_deducted) {
            return Err(StoreError::Conflict(update.advance.id));
        }
    }

    Ok(())
}

fn reverse_lines(data: &mut MemoryData, line_ids: &[Uuid], at: DateTimeWithTimeZone) {
    for line in data.deductions.iter_mut().filter(|d| line_ids.contains(&d.id) && d.reversed_at.is_none()) {
        line.reversed_at = Some(at);
        line.updated_at = at;
    }
}

fn write_advances(data: &mut MemoryData, updates: &[AdvanceUpdate], at: DateTimeWithTimeZone) {
    for update in updates {
        if let Some(advance) = data.advances.iter_mut().find(|a| a.id == update.advance.id) {
            advance.amount_deducted = update.advance.amount_deducted;
            advance.remaining_amount = update.advance.remaining_amount;
            advance.deduction_status = update.advance.deduction_status;
            advance.updated_at = at;
        }
    }
}
