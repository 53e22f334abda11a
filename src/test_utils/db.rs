use rusqlite::Connection;
use time::{Date, macros::{date, datetime}};

use crate::{
    GroupId, TransactionId, TransferId, UserID, YearMonth, initialize_db,
    settlement::settle_month,
    transaction::{TransactionPayload, TransactionType, post_transaction},
};

#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("could not create in-memory SQLite database");
    initialize_db(&connection).expect("could not initialize test DB");

    connection
}

/// An expense in the 食費/食料品 category with no shop or memo.
pub(crate) fn test_payload(transaction_date: Date, amount: i64) -> TransactionPayload {
    TransactionPayload {
        transaction_type: TransactionType::Expense,
        transaction_date,
        shop: None,
        memo: None,
        amount,
        big_category_id: 2,
        medium_category_id: Some(4),
        custom_category_id: None,
    }
}

/// Post expenses of 3000 by "taro" and 1000 by "hanako" in March 2021, then
/// settle the month.
///
/// Returns the IDs of the posted transactions and of the stored transfers.
#[track_caller]
pub(crate) fn settle_month_for_test(
    group_id: GroupId,
    connection: &Connection,
) -> (Vec<TransactionId>, Vec<TransferId>) {
    let now = datetime!(2021-03-31 12:00:00 UTC);
    let transaction_ids = [
        ("taro", date!(2021 - 03 - 05), 3000),
        ("hanako", date!(2021 - 03 - 20), 1000),
    ]
    .into_iter()
    .map(|(user, transaction_date, amount)| {
        post_transaction(
            group_id,
            &UserID::new(user),
            &test_payload(transaction_date, amount),
            now,
            connection,
        )
        .expect("could not create test transaction")
        .id
    })
    .collect();

    let month = YearMonth::new(2021, time::Month::March).expect("could not create test month");
    let settlement =
        settle_month(group_id, month, connection).expect("could not settle test month");
    let transfer_ids = settlement
        .transfers
        .iter()
        .map(|transfer| transfer.id)
        .collect();

    (transaction_ids, transfer_ids)
}
