//! Sums the expenses of each member of a group over a date window.

use rusqlite::Connection;
use time::Date;

use crate::{Error, GroupId, settlement::planner::UserPaymentTotal};

/// Sum the expenses each user posted in `group_id` between `first_day` and
/// `last_day`, both inclusive.
///
/// Incomes are not counted. Users without expenses in the window are left out.
/// The result is ordered by user ID.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn totals_by_user(
    group_id: GroupId,
    first_day: Date,
    last_day: Date,
    connection: &Connection,
) -> Result<Vec<UserPaymentTotal>, Error> {
    connection
        .prepare(
            "SELECT user_id, SUM(amount) FROM group_transactions
             WHERE group_id = ?1
               AND transaction_type = 'expense'
               AND transaction_date >= ?2
               AND transaction_date <= ?3
             GROUP BY user_id
             ORDER BY user_id",
        )?
        .query_map((group_id, first_day, last_day), |row| {
            Ok(UserPaymentTotal {
                user_id: row.get(0)?,
                total_payment_amount: row.get(1)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}
