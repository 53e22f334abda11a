use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State, rejection::PathRejection},
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, GroupId,
    database_id::TransactionId,
    db::lock_connection,
    responses::message_response,
    transaction::db::delete_transaction,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction, responds with a message.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    path: Result<Path<(GroupId, TransactionId)>, PathRejection>,
) -> Result<Response, Error> {
    let Path((group_id, transaction_id)) = path?;

    let connection = lock_connection(&state.db_connection)?;
    delete_transaction(group_id, transaction_id, &connection)?;

    Ok(message_response(format!(
        "Deleted transaction {transaction_id}."
    )))
}
