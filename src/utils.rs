use rust_decimal::{Decimal, RoundingStrategy};

use crate::consts::{MONEY_SCALE, PAGE_LIMIT};

/// Rounds toward zero so a derived amount never exceeds its source
pub fn truncate_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero)
}

/// Turns an optional 1-based page and limit into a 0-based page index and a bounded page size
pub fn page_window(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let limit = limit.unwrap_or(PAGE_LIMIT.0).clamp(1, PAGE_LIMIT.1);
    // The store offsets by `page * limit`, which must not overflow
    let page = page.unwrap_or(1).clamp(1, u64::MAX / limit);

    (page - 1, limit)
}
