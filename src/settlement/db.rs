//! The settlement store: the transfers that settle a month for a group.
//!
//! The presence of any transfer row for a (group, month) is what locks the month.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::{
    Error, GroupId, UserID, YearMonth,
    database_id::TransferId,
    settlement::{lock::is_settled, planner::PlannedTransfer},
};

// ============================================================================
// MODELS
// ============================================================================

/// A stored transfer: a payer owes a recipient an amount for a settled month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// The ID of the transfer.
    pub id: TransferId,
    /// The group the settlement belongs to.
    pub group_id: GroupId,
    /// The settled month.
    pub month: YearMonth,
    /// The user who owes money.
    pub payer_user_id: UserID,
    /// The user who is owed money.
    pub recipient_user_id: UserID,
    /// How much the payer owes the recipient.
    pub payment_amount: i64,
    /// Whether the payer has marked the transfer as paid.
    pub payment_confirmation: bool,
    /// Whether the recipient has marked the transfer as received.
    pub receipt_confirmation: bool,
}

/// New values for the confirmation flags of one transfer.
///
/// Other transfer fields sent by the client are ignored, since amounts and
/// users cannot change after a settlement is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfirmation {
    /// The transfer to update.
    pub id: TransferId,
    /// Whether the payer has marked the transfer as paid.
    pub payment_confirmation: bool,
    /// Whether the recipient has marked the transfer as received.
    pub receipt_confirmation: bool,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Get the transfers of the settlement for `group_id` and `month`, ordered by ID.
///
/// An empty list means the month has not been settled.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn read_settlement(
    group_id: GroupId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<Transfer>, Error> {
    connection
        .prepare(
            "SELECT id, group_id, year_month, payer_user_id, recipient_user_id, payment_amount, \
                payment_confirmation, receipt_confirmation
             FROM group_accounts
             WHERE group_id = ?1 AND year_month = ?2
             ORDER BY id",
        )?
        .query_map((group_id, month), map_transfer_row)?
        .map(|maybe_transfer| maybe_transfer.map_err(Error::from))
        .collect()
}

/// Store `transfers` as the settlement for `group_id` and `month`.
///
/// Either all transfers are stored or none are. The server settles through
/// `settle_month`, which stores the rows inside its own database transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::AlreadySettled] if the month already has a settlement,
/// - or [Error::SqlError] if there is some other SQL error.
#[cfg(test)]
pub fn create_settlement(
    group_id: GroupId,
    month: YearMonth,
    transfers: &[PlannedTransfer],
    connection: &Connection,
) -> Result<Vec<Transfer>, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let created = insert_settlement_rows(group_id, month, transfers, &transaction)?;

    transaction.commit()?;

    Ok(created)
}

/// Insert the rows of a new settlement without opening a database transaction.
///
/// Callers must already be inside a database transaction.
pub(super) fn insert_settlement_rows(
    group_id: GroupId,
    month: YearMonth,
    transfers: &[PlannedTransfer],
    connection: &Connection,
) -> Result<Vec<Transfer>, Error> {
    if is_settled(group_id, month, connection)? {
        return Err(Error::AlreadySettled(month));
    }

    let mut statement = connection.prepare(
        "INSERT INTO group_accounts (group_id, year_month, payer_user_id, recipient_user_id, \
            payment_amount)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    for transfer in transfers {
        statement.execute((
            group_id,
            month,
            &transfer.payer,
            &transfer.recipient,
            transfer.amount,
        ))?;
    }

    tracing::debug!(
        "Stored {} transfers settling group {group_id} for {month}",
        transfers.len()
    );

    read_settlement(group_id, month, connection)
}

/// Set the confirmation flags of the given transfers of the settlement for
/// `group_id` and `month`, and return the whole settlement afterwards.
///
/// All updates are applied together: if any transfer is not part of the
/// settlement, none are applied.
///
/// # Errors
/// This function will return a:
/// - [Error::NotSettled] if the month has no settlement,
/// - [Error::MissingTransfer] if a transfer ID is not part of the settlement,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_confirmations(
    group_id: GroupId,
    month: YearMonth,
    confirmations: &[TransferConfirmation],
    connection: &Connection,
) -> Result<Vec<Transfer>, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    if !is_settled(group_id, month, &transaction)? {
        return Err(Error::NotSettled(month));
    }

    {
        let mut statement = transaction.prepare(
            "UPDATE group_accounts
             SET payment_confirmation = ?1, receipt_confirmation = ?2
             WHERE id = ?3 AND group_id = ?4 AND year_month = ?5",
        )?;

        for confirmation in confirmations {
            let rows_affected = statement.execute((
                confirmation.payment_confirmation,
                confirmation.receipt_confirmation,
                confirmation.id,
                group_id,
                month,
            ))?;

            if rows_affected == 0 {
                return Err(Error::MissingTransfer(confirmation.id));
            }
        }
    }

    let updated = read_settlement(group_id, month, &transaction)?;
    transaction.commit()?;

    Ok(updated)
}

/// Delete the settlement for `group_id` and `month`, unlocking the month.
///
/// # Errors
/// This function will return a:
/// - [Error::NotSettled] if the month has no settlement,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_settlement(
    group_id: GroupId,
    month: YearMonth,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let rows_affected = transaction.execute(
        "DELETE FROM group_accounts WHERE group_id = ?1 AND year_month = ?2",
        (group_id, month),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotSettled(month));
    }

    transaction.commit()?;
    tracing::debug!("Deleted the settlement of group {group_id} for {month}");

    Ok(())
}

/// Create the transfer table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_settlement_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS group_accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL,
            year_month TEXT NOT NULL,
            payer_user_id TEXT NOT NULL,
            recipient_user_id TEXT NOT NULL,
            payment_amount INTEGER NOT NULL CHECK (payment_amount >= 1),
            payment_confirmation INTEGER NOT NULL DEFAULT 0,
            receipt_confirmation INTEGER NOT NULL DEFAULT 0,
            CHECK (payer_user_id <> recipient_user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_group_accounts_group_month
            ON group_accounts(group_id, year_month);",
    )
}

fn map_transfer_row(row: &Row) -> Result<Transfer, rusqlite::Error> {
    Ok(Transfer {
        id: row.get(0)?,
        group_id: row.get(1)?,
        month: row.get(2)?,
        payer_user_id: row.get(3)?,
        recipient_user_id: row.get(4)?,
        payment_amount: row.get(5)?,
        payment_confirmation: row.get(6)?,
        receipt_confirmation: row.get(7)?,
    })
}
