//! The transaction store: database functions for group transactions.
//!
//! Every mutation checks the month lock inside the same database transaction
//! as the write, so a settlement committed by another request is either seen
//! by the check or happens strictly after the write.

use rusqlite::{Connection, OptionalExtension, Transaction as SqlTransaction, TransactionBehavior};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    Error, UserID, YearMonth,
    category::validate_category,
    database_id::{GroupId, TransactionId},
    settlement::ensure_unlocked,
    transaction::core::{
        GroupTransaction, SELECT_TRANSACTION, TransactionPayload, map_transaction_row,
    },
};

/// Record a new transaction posted by `user_id` in `group_id`.
///
/// `now` becomes both the posted and the updated date.
///
/// # Errors
/// This function will return a:
/// - [Error::MonthLocked] if the month of the transaction date has been settled,
/// - [Error::InvalidAmount] if the amount is less than one,
/// - [Error::BadCategory] or [Error::InvalidCategory] if the categories are not valid,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn post_transaction(
    group_id: GroupId,
    user_id: &UserID,
    payload: &TransactionPayload,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<GroupTransaction, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    ensure_unlocked(group_id, payload.month(), &transaction)?;
    check_payload(group_id, payload, &transaction)?;

    let now = now.to_offset(UtcOffset::UTC);
    let id: TransactionId = transaction.query_row(
        "INSERT INTO group_transactions (group_id, transaction_type, posted_date, updated_date, \
            transaction_date, shop, memo, amount, user_id, big_category_id, medium_category_id, \
            custom_category_id)
         VALUES (?1, ?2, ?3, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         RETURNING id",
        rusqlite::params![
            group_id,
            payload.transaction_type,
            now,
            payload.transaction_date,
            payload.shop(),
            payload.memo(),
            payload.amount,
            user_id,
            payload.big_category_id,
            payload.medium_category_id,
            payload.custom_category_id,
        ],
        |row| row.get(0),
    )?;

    let created = select_transaction(group_id, id, &transaction)?.ok_or_else(|| {
        tracing::error!("Transaction {id} could not be read back after it was inserted");
        Error::SqlError(rusqlite::Error::QueryReturnedNoRows)
    })?;

    transaction.commit()?;
    tracing::debug!("Created transaction {id} in group {group_id}");

    Ok(created)
}

/// Replace the client-supplied fields of the transaction `id` in `group_id`.
///
/// Both the month the transaction is currently in and the month it moves to
/// must be unlocked.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if the group has no transaction with `id`,
/// - [Error::MonthLocked] if either month has been settled,
/// - [Error::InvalidAmount], [Error::BadCategory] or [Error::InvalidCategory]
///   if the payload is not valid,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn put_transaction(
    group_id: GroupId,
    id: TransactionId,
    payload: &TransactionPayload,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<GroupTransaction, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let stored_date =
        select_transaction_date(group_id, id, &transaction)?.ok_or(Error::UpdateMissingTransaction)?;
    let stored_month = YearMonth::from_date(stored_date);

    ensure_unlocked(group_id, stored_month, &transaction)?;
    if payload.month() != stored_month {
        ensure_unlocked(group_id, payload.month(), &transaction)?;
    }
    check_payload(group_id, payload, &transaction)?;

    transaction.execute(
        "UPDATE group_transactions
         SET transaction_type = ?1,
             updated_date = ?2,
             transaction_date = ?3,
             shop = ?4,
             memo = ?5,
             amount = ?6,
             big_category_id = ?7,
             medium_category_id = ?8,
             custom_category_id = ?9
         WHERE id = ?10 AND group_id = ?11",
        rusqlite::params![
            payload.transaction_type,
            now.to_offset(UtcOffset::UTC),
            payload.transaction_date,
            payload.shop(),
            payload.memo(),
            payload.amount,
            payload.big_category_id,
            payload.medium_category_id,
            payload.custom_category_id,
            id,
            group_id,
        ],
    )?;

    let updated = select_transaction(group_id, id, &transaction)?.ok_or(Error::UpdateMissingTransaction)?;

    transaction.commit()?;
    tracing::debug!("Updated transaction {id} in group {group_id}");

    Ok(updated)
}

/// Delete the transaction `id` from `group_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if the group has no transaction with `id`,
/// - [Error::MonthLocked] if the month of the stored transaction has been settled,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    group_id: GroupId,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let stored_date =
        select_transaction_date(group_id, id, &transaction)?.ok_or(Error::DeleteMissingTransaction)?;

    ensure_unlocked(group_id, YearMonth::from_date(stored_date), &transaction)?;

    transaction.execute(
        "DELETE FROM group_transactions WHERE id = ?1 AND group_id = ?2",
        (id, group_id),
    )?;

    transaction.commit()?;
    tracing::debug!("Deleted transaction {id} from group {group_id}");

    Ok(())
}

/// Retrieve the transaction `id` of `group_id`, or `None` if the group has no such transaction.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
#[cfg(test)]
pub fn get_transaction(
    group_id: GroupId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Option<GroupTransaction>, Error> {
    select_transaction(group_id, id, connection)
}

/// Get the transactions of `group_id` dated within `month`.
///
/// The newest transaction dates come first, ties are broken by the most recently updated.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_by_month(
    group_id: GroupId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<GroupTransaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION}
             WHERE t.group_id = ?1 AND t.transaction_date >= ?2 AND t.transaction_date < ?3
             ORDER BY t.transaction_date DESC, t.updated_date DESC, t.id DESC"
        ))?
        .query_map(
            rusqlite::params![group_id, month.first_day(), month.first_day_of_next_month()],
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Create the group transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS group_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL,
            transaction_type TEXT NOT NULL CHECK (transaction_type IN ('expense', 'income')),
            posted_date TEXT NOT NULL,
            updated_date TEXT NOT NULL,
            transaction_date TEXT NOT NULL,
            shop TEXT,
            memo TEXT,
            amount INTEGER NOT NULL CHECK (amount >= 1),
            user_id TEXT NOT NULL,
            big_category_id INTEGER NOT NULL,
            medium_category_id INTEGER,
            custom_category_id INTEGER,
            CHECK ((medium_category_id IS NULL) <> (custom_category_id IS NULL)),
            FOREIGN KEY(big_category_id) REFERENCES big_category(id),
            FOREIGN KEY(medium_category_id) REFERENCES medium_category(id),
            FOREIGN KEY(custom_category_id) REFERENCES custom_category(id)
        );

        CREATE INDEX IF NOT EXISTS idx_group_transactions_group_date
            ON group_transactions(group_id, transaction_date);",
    )
}

fn check_payload(
    group_id: GroupId,
    payload: &TransactionPayload,
    connection: &Connection,
) -> Result<(), Error> {
    payload.check_amount()?;
    validate_category(group_id, &payload.category(), connection)
}

fn select_transaction(
    group_id: GroupId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Option<GroupTransaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE t.id = ?1 AND t.group_id = ?2"
        ))?
        .query_row((id, group_id), map_transaction_row)
        .optional()
        .map_err(Error::from)
}

fn select_transaction_date(
    group_id: GroupId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Option<Date>, Error> {
    connection
        .query_row(
            "SELECT transaction_date FROM group_transactions WHERE id = ?1 AND group_id = ?2",
            (id, group_id),
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
}

#[cfg(test)]
mod transaction_store_tests {
    use time::macros::{date, datetime};

    use crate::{
        Error, UserID, YearMonth,
        category::create_custom_category,
        test_utils::{get_test_connection, settle_month_for_test, test_payload},
    };

    use super::{delete_transaction, get_transaction, list_by_month, post_transaction, put_transaction};

    const GROUP: i64 = 7;

    fn month(text: &str) -> YearMonth {
        text.parse().unwrap()
    }

    #[test]
    fn post_then_get() {
        let conn = get_test_connection();
        let user = UserID::new("taro");
        let now = datetime!(2021-03-15 12:00:00 UTC);

        let created = post_transaction(
            GROUP,
            &user,
            &test_payload(date!(2021 - 03 - 15), 1200),
            now,
            &conn,
        )
        .unwrap();

        assert_eq!(created.amount, 1200);
        assert_eq!(created.user_id, user);
        assert_eq!(created.posted_date, now);
        assert_eq!(created.updated_date, now);
        assert_eq!(created.big_category_name, "食費");
        assert_eq!(created.medium_category_name.as_deref(), Some("食料品"));
        assert_eq!(get_transaction(GROUP, created.id, &conn), Ok(Some(created)));
    }

    #[test]
    fn get_is_scoped_to_group() {
        let conn = get_test_connection();
        let created = post_transaction(
            GROUP,
            &UserID::new("taro"),
            &test_payload(date!(2021 - 03 - 15), 1200),
            datetime!(2021-03-15 12:00:00 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(get_transaction(GROUP + 1, created.id, &conn), Ok(None));
    }

    #[test]
    fn post_rejects_non_positive_amount() {
        let conn = get_test_connection();

        let result = post_transaction(
            GROUP,
            &UserID::new("taro"),
            &test_payload(date!(2021 - 03 - 15), 0),
            datetime!(2021-03-15 12:00:00 UTC),
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidAmount(0)));
    }

    #[test]
    fn post_rejects_both_sub_categories() {
        let conn = get_test_connection();
        let custom_category_id = create_custom_category(GROUP, 2, "おやつ", &conn).unwrap();
        let mut payload = test_payload(date!(2021 - 03 - 15), 100);
        payload.custom_category_id = Some(custom_category_id);

        let result = post_transaction(
            GROUP,
            &UserID::new("taro"),
            &payload,
            datetime!(2021-03-15 12:00:00 UTC),
            &conn,
        );

        assert_eq!(result, Err(Error::BadCategory));
    }

    #[test]
    fn post_accepts_custom_category() {
        let conn = get_test_connection();
        let custom_category_id = create_custom_category(GROUP, 2, "おやつ", &conn).unwrap();
        let mut payload = test_payload(date!(2021 - 03 - 15), 100);
        payload.medium_category_id = None;
        payload.custom_category_id = Some(custom_category_id);

        let created = post_transaction(
            GROUP,
            &UserID::new("taro"),
            &payload,
            datetime!(2021-03-15 12:00:00 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(created.custom_category_name.as_deref(), Some("おやつ"));
        assert_eq!(created.medium_category_name, None);
    }

    #[test]
    fn post_into_settled_month_is_locked_without_side_effects() {
        let conn = get_test_connection();
        settle_month_for_test(GROUP, &conn);

        let result = post_transaction(
            GROUP,
            &UserID::new("taro"),
            &test_payload(date!(2021 - 03 - 20), 100),
            datetime!(2021-03-21 12:00:00 UTC),
            &conn,
        );

        assert_eq!(result, Err(Error::MonthLocked(month("2021-03"))));
        assert_eq!(list_by_month(GROUP, month("2021-03"), &conn).unwrap().len(), 2);
    }

    #[test]
    fn post_into_other_month_or_group_is_not_locked() {
        let conn = get_test_connection();
        settle_month_for_test(GROUP, &conn);
        let user = UserID::new("taro");
        let now = datetime!(2021-04-01 12:00:00 UTC);

        assert!(
            post_transaction(GROUP, &user, &test_payload(date!(2021 - 04 - 01), 100), now, &conn)
                .is_ok()
        );
        assert!(
            post_transaction(GROUP, &user, &test_payload(date!(2021 - 02 - 28), 100), now, &conn)
                .is_ok()
        );
        assert!(
            post_transaction(
                GROUP + 1,
                &user,
                &test_payload(date!(2021 - 03 - 15), 100),
                now,
                &conn
            )
            .is_ok()
        );
    }

    #[test]
    fn put_updates_fields_and_updated_date() {
        let conn = get_test_connection();
        let created = post_transaction(
            GROUP,
            &UserID::new("taro"),
            &test_payload(date!(2021 - 03 - 15), 1200),
            datetime!(2021-03-15 12:00:00 UTC),
            &conn,
        )
        .unwrap();
        let mut payload = test_payload(date!(2021 - 03 - 16), 900);
        payload.shop = Some("コンビニ".to_owned());
        let later = datetime!(2021-03-17 08:00:00 UTC);

        let updated = put_transaction(GROUP, created.id, &payload, later, &conn).unwrap();

        assert_eq!(updated.amount, 900);
        assert_eq!(updated.transaction_date, date!(2021 - 03 - 16));
        assert_eq!(updated.shop.as_deref(), Some("コンビニ"));
        assert_eq!(updated.posted_date, created.posted_date);
        assert_eq!(updated.updated_date, later);
        assert_eq!(updated.user_id, created.user_id);
    }

    #[test]
    fn put_missing_transaction_fails() {
        let conn = get_test_connection();

        let result = put_transaction(
            GROUP,
            42,
            &test_payload(date!(2021 - 03 - 15), 100),
            datetime!(2021-03-15 12:00:00 UTC),
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn put_checks_lock_of_stored_and_new_month() {
        let conn = get_test_connection();
        let april = post_transaction(
            GROUP,
            &UserID::new("taro"),
            &test_payload(date!(2021 - 04 - 02), 100),
            datetime!(2021-04-02 12:00:00 UTC),
            &conn,
        )
        .unwrap();
        let (march_ids, _) = settle_month_for_test(GROUP, &conn);
        let now = datetime!(2021-04-03 12:00:00 UTC);

        // Moving a transaction into a settled month.
        assert_eq!(
            put_transaction(GROUP, april.id, &test_payload(date!(2021 - 03 - 31), 100), now, &conn),
            Err(Error::MonthLocked(month("2021-03")))
        );
        // Moving a transaction out of a settled month.
        assert_eq!(
            put_transaction(GROUP, march_ids[0], &test_payload(date!(2021 - 04 - 05), 100), now, &conn),
            Err(Error::MonthLocked(month("2021-03")))
        );
        assert_eq!(
            get_transaction(GROUP, april.id, &conn).unwrap().unwrap().amount,
            100
        );
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let created = post_transaction(
            GROUP,
            &UserID::new("taro"),
            &test_payload(date!(2021 - 03 - 15), 1200),
            datetime!(2021-03-15 12:00:00 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(delete_transaction(GROUP, created.id, &conn), Ok(()));
        assert_eq!(get_transaction(GROUP, created.id, &conn), Ok(None));
        assert_eq!(
            delete_transaction(GROUP, created.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
    }

    #[test]
    fn delete_in_settled_month_is_locked() {
        let conn = get_test_connection();
        let (march_ids, _) = settle_month_for_test(GROUP, &conn);

        assert_eq!(
            delete_transaction(GROUP, march_ids[0], &conn),
            Err(Error::MonthLocked(month("2021-03")))
        );
        assert!(get_transaction(GROUP, march_ids[0], &conn).unwrap().is_some());
    }

    #[test]
    fn list_by_month_orders_by_date_then_updated_date() {
        let conn = get_test_connection();
        let user = UserID::new("taro");
        let early = post_transaction(
            GROUP,
            &user,
            &test_payload(date!(2021 - 03 - 01), 100),
            datetime!(2021-03-01 12:00:00 UTC),
            &conn,
        )
        .unwrap();
        let late_updated_first = post_transaction(
            GROUP,
            &user,
            &test_payload(date!(2021 - 03 - 31), 200),
            datetime!(2021-03-31 12:00:00 UTC),
            &conn,
        )
        .unwrap();
        let late_updated_second = post_transaction(
            GROUP,
            &user,
            &test_payload(date!(2021 - 03 - 31), 300),
            datetime!(2021-03-31 18:00:00 UTC),
            &conn,
        )
        .unwrap();
        post_transaction(
            GROUP,
            &user,
            &test_payload(date!(2021 - 04 - 01), 400),
            datetime!(2021-04-01 12:00:00 UTC),
            &conn,
        )
        .unwrap();

        let got: Vec<i64> = list_by_month(GROUP, month("2021-03"), &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.id)
            .collect();

        assert_eq!(got, vec![late_updated_second.id, late_updated_first.id, early.id]);
    }

    #[test]
    fn list_by_month_is_empty_for_month_without_transactions() {
        let conn = get_test_connection();

        assert_eq!(list_by_month(GROUP, month("2021-03"), &conn), Ok(vec![]));
    }
}
