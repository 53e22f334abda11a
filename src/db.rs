//! Sets up the application's database.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, category::create_category_tables, settlement::create_settlement_table,
    transaction::create_transaction_table,
};

/// Create the application's tables and seed the default categories.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must be set outside of a transaction, otherwise SQLite ignores it.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_tables(&transaction)?;
    create_transaction_table(&transaction)?;
    create_settlement_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Make SQLite wait up to `timeout` for a write lock before failing with `SQLITE_BUSY`.
///
/// # Errors
/// Returns an error if the timeout cannot be set.
pub fn set_busy_timeout(connection: &Connection, timeout: Duration) -> Result<(), Error> {
    connection.busy_timeout(timeout)?;

    Ok(())
}

/// Acquire the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the mutex is poisoned.
pub fn lock_connection(
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}
