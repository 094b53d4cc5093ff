//! Installment schedule computation and payment registration
//!
//! Schedules are derived, never persisted: a settlement carries only the
//! agreed total, the remaining installment count and the first due date.
//! Registering a payment shrinks the remaining count; the plan does not
//! keep an itemized ledger of which installments were paid.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use tramita_core::{Centavos, InstallmentPlan, Proceeding};

/// One entry of a derived payment schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installment {
    pub due_date: NaiveDate,
    pub amount: Centavos,
}

/// Shift a due date off the weekend: Saturday moves two days forward,
/// Sunday one, both landing on Monday. No holiday calendar is consulted.
fn next_business_day(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Days::new(2),
        Weekday::Sun => date + Days::new(1),
        _ => date,
    }
}

/// Compute the payment schedule for `count` installments of `total`
/// centavos starting at `first_due`.
///
/// Amounts are an even split; the integer-division remainder lands on the
/// last installment so the schedule sums exactly to `total`. Due dates
/// chain at 30 calendar days from the PREVIOUS UNSHIFTED date, each then
/// shifted off the weekend independently - a shifted installment does not
/// push the rest of the chain.
pub fn compute_schedule(total: Centavos, count: u32, first_due: NaiveDate) -> Vec<Installment> {
    let count = count.max(1);
    let base_amount = total / count as Centavos;
    let remainder = total - base_amount * count as Centavos;

    let mut schedule = Vec::with_capacity(count as usize);
    let mut base_date = first_due;
    for i in 0..count {
        let amount = if i == count - 1 {
            base_amount + remainder
        } else {
            base_amount
        };
        schedule.push(Installment {
            due_date: next_business_day(base_date),
            amount,
        });
        base_date = base_date + Days::new(30);
    }
    schedule
}

/// What a registered payment did to the proceeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentResolution {
    /// Plan exhausted (or lump sum) - the proceeding is settled
    Settled,
    /// Count decremented; `remaining` installments still open
    NextInstallment { remaining: u32 },
}

/// Register one payment against the proceeding's installment plan.
///
/// Lump-sum plans and plans down to their last installment settle; any
/// other plan has its remaining count decremented (floor 1). The caller
/// (the transition engine) maps the resolution onto the kind's target
/// status.
pub fn register_payment(plan: &mut InstallmentPlan) -> PaymentResolution {
    if plan.lump_sum || plan.installment_count <= 1 {
        return PaymentResolution::Settled;
    }
    plan.installment_count = (plan.installment_count - 1).max(1);
    PaymentResolution::NextInstallment {
        remaining: plan.installment_count,
    }
}

/// Derived schedule for a proceeding's current plan, if it has one.
pub fn schedule_for(proceeding: &Proceeding) -> Option<Vec<Installment>> {
    proceeding.installment_plan.as_ref().map(|plan| {
        compute_schedule(plan.total_amount, plan.installment_count, plan.first_due_date)
    })
}

// ============================================================================
// TESTS
// ============================================================================
