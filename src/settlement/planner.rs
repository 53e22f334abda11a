//! Turns the per-user payment totals of a month into a list of transfers that
//! leaves every member having paid the group average.
//!
//! The planner is pure: it does not touch the database and needs no locking.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::UserID;

// ============================================================================
// MODELS
// ============================================================================

/// The sum of one user's expenses for a group and month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPaymentTotal {
    /// The user who paid.
    pub user_id: UserID,
    /// The total amount the user paid in the month.
    pub total_payment_amount: i64,
}

impl UserPaymentTotal {
    /// Create a new payment total for `user_id`.
    pub fn new(user_id: UserID, total_payment_amount: i64) -> Self {
        Self {
            user_id,
            total_payment_amount,
        }
    }
}

/// A single debt produced by the planner, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PlannedTransfer {
    /// The user who owes money.
    pub payer: UserID,
    /// The user who is owed money.
    pub recipient: UserID,
    /// How much the payer owes the recipient, always at least one.
    pub amount: i64,
}

/// The group-level figures of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettlementSummary {
    /// The sum of all user totals.
    pub total: i64,
    /// The total divided by the number of users, rounded half away from zero.
    pub average: i64,
    /// `total - average * n`, the rounding residue that no transfer covers.
    pub remainder: i64,
}

/// The output of [plan].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettlementPlan {
    /// The group total, average and rounding residue.
    pub summary: SettlementSummary,
    /// The transfers that settle the month. The order carries no meaning.
    pub transfers: Vec<PlannedTransfer>,
}

// ============================================================================
// PLANNING
// ============================================================================

/// Compute the group total, average and rounding residue for `totals`.
///
/// An empty slice gives all zeros.
pub fn summarize(totals: &[UserPaymentTotal]) -> SettlementSummary {
    if totals.is_empty() {
        return SettlementSummary::default();
    }

    let count = totals.len() as i128;
    let total: i128 = totals
        .iter()
        .map(|total| i128::from(total.total_payment_amount))
        .sum();
    let average = divide_rounding_half_away_from_zero(total, count);
    let remainder = total - average * count;

    SettlementSummary {
        total: saturate(total),
        average: saturate(average),
        remainder: saturate(remainder),
    }
}

/// Plan the transfers that settle a month.
///
/// Every user with a total above the average becomes a recipient and every
/// user below it becomes a payer. Payers and recipients whose balances cancel
/// exactly are paired first, then the remaining balances are swept greedily:
/// the largest recipient is paid by the payers in order, most indebted first,
/// until one side runs out.
///
/// When the average is not exact, the residue stays with the users on the
/// larger side and is reported as [SettlementSummary::remainder].
pub fn plan(totals: &[UserPaymentTotal]) -> SettlementPlan {
    let summary = summarize(totals);

    let mut recipients = Vec::new();
    let mut payers = Vec::new();

    for total in totals {
        let balance = Balance {
            user_id: &total.user_id,
            delta: total.total_payment_amount - summary.average,
        };

        if balance.delta > 0 {
            recipients.push(balance);
        } else if balance.delta < 0 {
            payers.push(balance);
        }
    }

    recipients.sort_by(|a, b| {
        (Reverse(a.delta), a.user_id).cmp(&(Reverse(b.delta), b.user_id))
    });
    payers.sort_by(|a, b| (a.delta, a.user_id).cmp(&(b.delta, b.user_id)));

    let mut transfers = Vec::new();
    pair_exact_matches(&mut payers, &mut recipients, &mut transfers);
    sweep(&mut payers, &mut recipients, &mut transfers);

    SettlementPlan { summary, transfers }
}

/// A user's distance from the average. Positive when owed, negative when owing.
#[derive(Debug)]
struct Balance<'a> {
    user_id: &'a UserID,
    delta: i64,
}

fn pair_exact_matches(
    payers: &mut [Balance],
    recipients: &mut [Balance],
    transfers: &mut Vec<PlannedTransfer>,
) {
    for payer in payers.iter_mut() {
        if payer.delta == 0 {
            continue;
        }

        let matching_recipient = recipients
            .iter_mut()
            .find(|recipient| recipient.delta != 0 && recipient.delta + payer.delta == 0);

        if let Some(recipient) = matching_recipient {
            transfers.push(PlannedTransfer {
                payer: payer.user_id.clone(),
                recipient: recipient.user_id.clone(),
                amount: recipient.delta,
            });
            payer.delta = 0;
            recipient.delta = 0;
        }
    }
}

fn sweep(
    payers: &mut [Balance],
    recipients: &mut [Balance],
    transfers: &mut Vec<PlannedTransfer>,
) {
    let mut i = 0;
    let mut j = 0;

    while i < recipients.len() && j < payers.len() {
        if recipients[i].delta == 0 {
            i += 1;
            j = 0;
            continue;
        }

        if payers[j].delta == 0 {
            j += 1;
            continue;
        }

        let recipient = &mut recipients[i];
        let payer = &mut payers[j];
        let residual = recipient.delta + payer.delta;

        if residual == 0 {
            transfers.push(transfer(payer, recipient, recipient.delta));
            recipient.delta = 0;
            payer.delta = 0;
            i += 1;
            j += 1;
        } else if residual < 0 {
            // The recipient is fully paid and the payer still owes the rest.
            transfers.push(transfer(payer, recipient, recipient.delta));
            recipient.delta = 0;
            payer.delta = residual;
            i += 1;
        } else {
            // The payer is drained and the recipient is still owed the rest.
            transfers.push(transfer(payer, recipient, -payer.delta));
            payer.delta = 0;
            recipient.delta = residual;
            j += 1;
        }
    }
}

fn transfer(payer: &Balance, recipient: &Balance, amount: i64) -> PlannedTransfer {
    PlannedTransfer {
        payer: payer.user_id.clone(),
        recipient: recipient.user_id.clone(),
        amount,
    }
}

fn divide_rounding_half_away_from_zero(dividend: i128, divisor: i128) -> i128 {
    let quotient = dividend / divisor;
    let remainder = dividend % divisor;

    if 2 * remainder.abs() >= divisor {
        quotient + dividend.signum()
    } else {
        quotient
    }
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

// ============================================================================
// TESTS
// ============================================================================
