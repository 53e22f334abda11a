//! The JSON form of a settlement.

use serde::{Deserialize, Serialize};

use crate::{
    GroupId, YearMonth,
    settlement::{
        db::Transfer,
        planner::{SettlementSummary, UserPaymentTotal, summarize},
        settle::Settlement,
    },
};

/// A settlement as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementResponse {
    /// The group that was settled.
    pub group_id: GroupId,
    /// The settled month.
    pub month: YearMonth,
    /// The sum of the expenses of all members.
    pub group_total_payment_amount: i64,
    /// The amount each member should have paid.
    pub group_average_payment_amount: i64,
    /// The rounding residue that no transfer covers.
    pub group_remaining_amount: i64,
    /// The expenses of each member.
    pub group_user_payment_list: Vec<UserPaymentTotal>,
    /// The transfers that settle the month.
    pub group_accounts_list: Vec<Transfer>,
}

impl SettlementResponse {
    /// Build the response for stored `transfers` from the `totals` they settle.
    pub fn new(
        group_id: GroupId,
        month: YearMonth,
        totals: Vec<UserPaymentTotal>,
        transfers: Vec<Transfer>,
    ) -> Self {
        let summary = summarize(&totals);

        Self::from_parts(group_id, month, summary, totals, transfers)
    }

    /// Build the response for a settlement that was just created.
    pub fn from_settlement(group_id: GroupId, month: YearMonth, settlement: Settlement) -> Self {
        Self::from_parts(
            group_id,
            month,
            settlement.summary,
            settlement.totals,
            settlement.transfers,
        )
    }

    fn from_parts(
        group_id: GroupId,
        month: YearMonth,
        summary: SettlementSummary,
        totals: Vec<UserPaymentTotal>,
        transfers: Vec<Transfer>,
    ) -> Self {
        Self {
            group_id,
            month,
            group_total_payment_amount: summary.total,
            group_average_payment_amount: summary.average,
            group_remaining_amount: summary.remainder,
            group_user_payment_list: totals,
            group_accounts_list: transfers,
        }
    }
}
