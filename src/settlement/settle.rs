//! Settles a month: aggregate, plan and store in one database transaction.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, GroupId, YearMonth,
    settlement::{
        aggregation::totals_by_user,
        db::{Transfer, insert_settlement_rows},
        lock::is_settled,
        planner::{SettlementSummary, UserPaymentTotal, plan},
    },
};

/// A stored settlement together with the totals it was planned from.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// The group total, average and rounding residue.
    pub summary: SettlementSummary,
    /// The expenses of each member in the month.
    pub totals: Vec<UserPaymentTotal>,
    /// The stored transfers.
    pub transfers: Vec<Transfer>,
}

/// Settle `month` for `group_id`.
///
/// The totals are read, planned and stored inside one database transaction,
/// so a transaction edit either lands before the totals are read or is
/// rejected because the month is locked.
///
/// # Errors
/// This function will return a:
/// - [Error::AlreadySettled] if the month already has a settlement,
/// - [Error::NothingToSettle] if every member paid the same amount or there are no expenses,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn settle_month(
    group_id: GroupId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Settlement, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    if is_settled(group_id, month, &transaction)? {
        return Err(Error::AlreadySettled(month));
    }

    let totals = totals_by_user(group_id, month.first_day(), month.last_day(), &transaction)?;
    let settlement_plan = plan(&totals);

    if settlement_plan.transfers.is_empty() {
        return Err(Error::NothingToSettle(month));
    }

    let transfers =
        insert_settlement_rows(group_id, month, &settlement_plan.transfers, &transaction)?;

    transaction.commit()?;
    tracing::info!(
        "Settled group {group_id} for {month} with {} transfers",
        transfers.len()
    );

    Ok(Settlement {
        summary: settlement_plan.summary,
        totals,
        transfers,
    })
}
