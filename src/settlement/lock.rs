//! The month lock: a month is locked for a group while it has a settlement.

use rusqlite::Connection;

use crate::{Error, GroupId, YearMonth};

/// Whether `month` has been settled for `group_id`.
///
/// Call this on the same connection, inside the same database transaction, as
/// the write it guards.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn is_settled(
    group_id: GroupId,
    month: YearMonth,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM group_accounts WHERE group_id = ?1 AND year_month = ?2)",
            (group_id, month),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Fail unless `month` is still open for changes in `group_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::MonthLocked] if the month has been settled,
/// - or [Error::SqlError] if there is an SQL error.
pub fn ensure_unlocked(
    group_id: GroupId,
    month: YearMonth,
    connection: &Connection,
) -> Result<(), Error> {
    if is_settled(group_id, month, connection)? {
        tracing::warn!("Rejected a change to group {group_id} in {month}: the month is settled");
        return Err(Error::MonthLocked(month));
    }

    Ok(())
}
