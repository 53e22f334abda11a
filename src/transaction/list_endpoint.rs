use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error, GroupId, YearMonth,
    db::lock_connection,
    responses::message_response,
    transaction::{core::GroupTransaction, db::list_by_month},
};

/// The state needed to list the transactions of a month.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A list of group transactions.
#[derive(Debug, Serialize)]
pub struct TransactionList {
    /// The transactions, newest first.
    pub transactions_list: Vec<GroupTransaction>,
}

/// Respond with `transactions`, or with a message if there are none.
pub(super) fn transaction_list_response(
    transactions: Vec<GroupTransaction>,
    empty_message: String,
) -> Response {
    if transactions.is_empty() {
        return message_response(empty_message);
    }

    Json(TransactionList {
        transactions_list: transactions,
    })
    .into_response()
}

/// A route handler for getting the transactions of a group for a month given as `yyyy-MM`.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    path: Result<Path<(GroupId, String)>, PathRejection>,
) -> Result<Response, Error> {
    let Path((group_id, month)) = path?;
    let month: YearMonth = month.parse()?;

    let connection = lock_connection(&state.db_connection)?;
    let transactions = list_by_month(group_id, month, &connection)?;

    Ok(transaction_list_response(
        transactions,
        format!("There are no transactions for {month}."),
    ))
}
